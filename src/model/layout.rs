//! The struct layout engine: per-field `(i, a, b, c)` offset descriptors,
//! the framing-offset count, and the container offset-slot width function.
//!
//! This is a faithful implementation of the algorithm given in
//! `SPEC_FULL.md` §4.3/§4.4; see that document for the derivation. Two
//! computations are kept deliberately separate even though they walk the
//! same field list:
//!
//! - [`compute_field_locations`] produces the `(i, a, b, c)` descriptor
//!   every emitted getter needs, valid whether or not the struct itself
//!   ends up fixed-size.
//! - [`compute_fixed_size`] produces the struct's own `fixed_size`, using
//!   the simpler closed-form cumulative-offset definition, and is only
//!   ever called once [`compute_field_locations`] has confirmed every
//!   field is fixed.

/// The per-field shape the layout engine needs: its alignment and,
/// when fixed, its size.
#[derive(Copy, Clone, Debug)]
pub struct FieldShape {
    /// `alignment(field)`
    pub alignment: usize,
    /// `is_fixed(field)`
    pub is_fixed: bool,
    /// `fixed_size(field)`, meaningful only when `is_fixed`.
    pub fixed_size: usize,
}

/// The `(i, a, b, c)` descriptor for one struct field.
///
/// At runtime, the field's byte offset inside the struct body is
/// `((end_of_frame(i) + a + b) & !b) + c`, where `end_of_frame(-1) == 0`
/// and `end_of_frame(i)` for `i >= 0` is the `i`-th framing offset read
/// from the tail of the body.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FieldLocation {
    /// The framing-offset index to read, or `-1` to use `0` directly.
    pub frame_index: i32,
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

/// Round `value` down to a multiple of `alignment` (a power of two).
#[inline]
pub fn align_down(value: usize, alignment: usize) -> usize {
    value & !(alignment - 1)
}

/// Round `value` up to a multiple of `alignment` (a power of two).
#[inline]
pub fn align_up(value: usize, alignment: usize) -> usize {
    align_down(value + alignment - 1, alignment)
}

/// Round `value` up using an alignment-minus-one bitmask, matching the
/// `align(c, d)` calls in the offset-table algorithm (`d`/`b` are already
/// stored as `alignment - 1`).
#[inline]
fn align_mask(value: usize, mask: usize) -> usize {
    (value + mask) & !mask
}

/// The result of running the per-field offset-table algorithm over an
/// entire struct.
pub struct StructLayout {
    /// One descriptor per field, in declaration order.
    pub locations: Vec<FieldLocation>,
    /// Whether every field turned out fixed (no frame advance ever
    /// happened).
    pub is_fixed: bool,
    /// The number of trailing framing-offset slots the struct's
    /// serialized form carries: every variable-sized field counts,
    /// except the last field of the struct when it is itself variable
    /// (its end is implied by the container size instead).
    pub framing_offset_count: usize,
}

/// Run the offset-table algorithm (`SPEC_FULL.md` §4.3) over a struct's
/// fields, left to right.
pub fn compute_field_locations(fields: &[FieldShape]) -> StructLayout {
    let mut locations = Vec::with_capacity(fields.len());
    let mut frame_index: i32 = -1;
    let mut a: usize = 0;
    let mut b: usize = 0;
    let mut c: usize = 0;
    let mut variable_count = 0usize;

    for field in fields {
        let d = field.alignment - 1;
        let e = if field.is_fixed { field.fixed_size } else { 0 };

        if d <= b {
            // Rule 1: still inside the same alignment run.
            c = align_mask(c, d);
        } else {
            // Rule 2: a wider alignment starts a new run.
            a += align_mask(c, b);
            b = d;
            c = 0;
        }

        locations.push(FieldLocation {
            frame_index,
            a,
            b,
            c,
        });

        if e == 0 {
            // Rule-implied frame advance: this field is variable-sized,
            // so everything after it is relative to a new framing offset.
            frame_index += 1;
            a = 0;
            b = 0;
            c = 0;
            variable_count += 1;
        } else {
            // Rule 3: still fixed, just extend the current run.
            c += e;
        }
    }

    let mut framing_offset_count = variable_count;
    if let Some(last) = fields.last() {
        if !last.is_fixed {
            framing_offset_count -= 1;
        }
    }

    StructLayout {
        locations,
        is_fixed: frame_index == -1,
        framing_offset_count,
    }
}

/// Compute the fixed size of a struct whose fields are all fixed, using
/// the closed-form cumulative definition: pad between fields to each
/// field's own alignment, then round the total up to the struct's
/// alignment. The empty (unit) struct is a special case with size `1`.
///
/// Panics (a debug assertion) if any field isn't fixed; callers must only
/// invoke this once [`compute_field_locations`] reports `is_fixed`.
pub fn compute_fixed_size(fields: &[FieldShape], struct_alignment: usize) -> usize {
    let mut pos = 0usize;
    for field in fields {
        debug_assert!(field.is_fixed, "compute_fixed_size called on a variable field");
        pos = align_up(pos, field.alignment);
        pos += field.fixed_size;
    }
    if pos == 0 {
        1
    } else {
        align_up(pos, struct_alignment)
    }
}

/// `w(S)`: the width in bytes of a single framing offset inside a
/// container of total serialized size `S`.
///
/// `S == 0` (an empty variable-sized container, which stores no offsets
/// at all) is defined to return `1`; no caller ever indexes into an empty
/// offset table, so the value is never actually read back.
pub fn offset_slot_width(container_size: usize) -> usize {
    if container_size == 0 {
        1
    } else if container_size <= 0xFF {
        1
    } else if container_size <= 0xFFFF {
        2
    } else if container_size <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(alignment: usize, size: usize) -> FieldShape {
        FieldShape {
            alignment,
            is_fixed: true,
            fixed_size: size,
        }
    }
    fn variable(alignment: usize) -> FieldShape {
        FieldShape {
            alignment,
            is_fixed: false,
            fixed_size: 0,
        }
    }

    #[test]
    fn unit_struct_has_no_fields_and_is_fixed() {
        let layout = compute_field_locations(&[]);
        assert!(layout.is_fixed);
        assert_eq!(layout.framing_offset_count, 0);
        assert_eq!(compute_fixed_size(&[], 1), 1);
    }

    #[test]
    fn pair_int32_byte_scenario() {
        // type Pair { a: int32; b: byte; }; -> fixed_size == 8
        let fields = [fixed(4, 4), fixed(1, 1)];
        let layout = compute_field_locations(&fields);
        assert!(layout.is_fixed);
        assert_eq!(layout.locations[0], FieldLocation { frame_index: -1, a: 0, b: 3, c: 0 });
        assert_eq!(layout.locations[1], FieldLocation { frame_index: -1, a: 0, b: 3, c: 4 });
        assert_eq!(compute_fixed_size(&fields, 4), 8);
    }

    #[test]
    fn mixed_two_variable_fields_scenario() {
        // type Mixed { tag: byte; name: string; vals: []int32; };
        // two variable fields -> framing_offset_count == 1
        let fields = [fixed(1, 1), variable(1), variable(4)];
        let layout = compute_field_locations(&fields);
        assert!(!layout.is_fixed);
        assert_eq!(layout.framing_offset_count, 1);
        assert_eq!(layout.locations[0].frame_index, -1);
        assert_eq!(layout.locations[1].frame_index, -1);
        assert_eq!(layout.locations[2].frame_index, 0);
    }

    #[test]
    fn trailing_variable_field_does_not_get_a_framing_offset() {
        let fields = [variable(1)];
        let layout = compute_field_locations(&fields);
        assert_eq!(layout.framing_offset_count, 0);
    }

    #[test]
    fn a_variable_field_followed_by_a_fixed_field_does_get_one() {
        let fields = [variable(1), fixed(4, 4)];
        let layout = compute_field_locations(&fields);
        assert_eq!(layout.framing_offset_count, 1);
    }

    #[test]
    fn slot_width_is_monotone_and_bounded() {
        assert_eq!(offset_slot_width(0), 1);
        assert_eq!(offset_slot_width(1), 1);
        assert_eq!(offset_slot_width(0xFF), 1);
        assert_eq!(offset_slot_width(0x100), 2);
        assert_eq!(offset_slot_width(0xFFFF), 2);
        assert_eq!(offset_slot_width(0x1_0000), 4);
        assert_eq!(offset_slot_width(0xFFFF_FFFF), 4);
        assert_eq!(offset_slot_width(0x1_0000_0000), 8);
        let widths: Vec<usize> = [0usize, 1, 0x100, 0x1_0000, 0x1_0000_0000]
            .iter()
            .map(|&s| offset_slot_width(s))
            .collect();
        assert!(widths.windows(2).all(|w| w[0] <= w[1]));
        for &s in &[0usize, 0x100, 0x1_0000, 0x1_0000_0000] {
            assert!(matches!(offset_slot_width(s), 1 | 2 | 4 | 8));
        }
    }
}
