//! Property tests for the tiling engine and the RLE codec.

use proptest::prelude::*;

use cocotile::mask::{rle, Mask};
use cocotile::tiling::{generate_offsets, tiles, TileSchema, Window};

proptest! {
    #[test]
    fn schema_constructs_exactly_when_step_is_positive(
        window in 1u32..2000,
        overlap in 0u32..1500,
    ) {
        let result = TileSchema::new(window, window, overlap, overlap);
        if window as i64 > 2 * overlap as i64 {
            let schema = result.expect("window > 2*overlap must construct");
            prop_assert_eq!(schema.step_w(), window - 2 * overlap);
            prop_assert_eq!(schema.step_h(), window - 2 * overlap);
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn clipped_grid_covers_parent_without_gaps(
        extent in 1u32..600,
        window in 1u32..128,
        overlap in 0u32..32,
    ) {
        prop_assume!(window as i64 > 2 * overlap as i64);
        let schema = TileSchema::new(window, window, overlap, overlap).unwrap();
        let parent = Window::new(0, 0, extent, extent);

        let mut covered = vec![false; extent as usize];
        for tile in tiles(&parent, &schema, false) {
            prop_assert!(tile.col_off() >= 0);
            prop_assert!(tile.col_off() + tile.width() as i64 <= extent as i64);
            for c in tile.col_off()..tile.col_off() + tile.width() as i64 {
                covered[c as usize] = true;
            }
        }
        prop_assert!(covered.iter().all(|&c| c), "gap in coverage of [0, {extent})");
    }

    #[test]
    fn offsets_are_deterministic_and_sorted_row_major(
        extent in 1u32..400,
        window in 2u32..64,
    ) {
        let schema = TileSchema::new(window, window, 0, 0).unwrap();
        let parent = Window::new(0, 0, extent, extent);

        let a = generate_offsets(&parent, &schema);
        let b = generate_offsets(&parent, &schema);
        prop_assert_eq!(&a, &b);

        // row-major: (row, col) lexicographic order
        for pair in a.windows(2) {
            let (c0, r0) = pair[0];
            let (c1, r1) = pair[1];
            prop_assert!((r0, c0) < (r1, c1));
        }
    }

    #[test]
    fn rle_roundtrip_preserves_mask(
        width in 1u32..24,
        height in 1u32..24,
        seed in any::<u64>(),
    ) {
        // cheap deterministic bit pattern per (seed, pixel)
        let mut mask = Mask::new(width, height);
        let mut state = seed | 1;
        for col in 0..width {
            for row in 0..height {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                if state >> 63 == 1 {
                    mask.set(col, row, true);
                }
            }
        }

        let encoded = rle::encode(&mask);
        prop_assert_eq!(rle::decode(&encoded), mask.clone());
        prop_assert_eq!(rle::area(&encoded), mask.count());

        let via_string = rle::from_string(&rle::to_string(&encoded), height, width);
        prop_assert_eq!(via_string, encoded);
    }

    #[test]
    fn rle_bbox_contains_all_foreground(
        width in 1u32..20,
        height in 1u32..20,
        x in 0u32..20,
        y in 0u32..20,
        w in 1u32..8,
        h in 1u32..8,
    ) {
        prop_assume!(x + w <= width && y + h <= height);
        let mut mask = Mask::new(width, height);
        for col in x..x + w {
            for row in y..y + h {
                mask.set(col, row, true);
            }
        }
        let encoded = rle::encode(&mask);
        prop_assert_eq!(rle::to_bbox(&encoded), [x as f64, y as f64, w as f64, h as f64]);
        prop_assert_eq!(rle::area(&encoded), (w * h) as u64);
    }
}
