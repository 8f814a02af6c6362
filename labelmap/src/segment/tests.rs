use super::*;
use crate::testing::{fill_rect, smooth_texture};

fn blank(width: usize, height: usize) -> LabelMask {
    LabelMask::new_default(width, height)
}

#[test]
fn test_two_disjoint_blobs_give_two_clusters() {
    let mut labels = blank(120, 80);
    fill_rect(&mut labels, 10, 5, 30, 30, 255);
    fill_rect(&mut labels, 70, 40, 30, 30, 255);
    let image = smooth_texture(120, 80, 3);

    let clusters = segment(&labels, &image, &SegmentConfig::default());
    assert_eq!(clusters.len(), 2);

    assert_eq!(clusters[0].bounds, Aabb::new(10, 39, 5, 34));
    assert_eq!(clusters[1].bounds, Aabb::new(70, 99, 40, 69));
    for cluster in &clusters {
        assert_eq!(cluster.mask.width(), 30);
        assert_eq!(cluster.mask.height(), 30);
        assert!(cluster.mask.iter().all(|&v| v == 255));
        assert_eq!(
            cluster.contents,
            image.crop(cluster.bounds.x_min, cluster.bounds.y_min, 30, 30)
        );
    }
}

#[test]
fn test_discovery_order_is_row_major() {
    let mut labels = blank(100, 100);
    // Lower blob starts further left, upper blob is found first anyway.
    fill_rect(&mut labels, 60, 2, 25, 25, 1);
    fill_rect(&mut labels, 2, 50, 25, 25, 2);

    let clusters = segment(&labels, &blank(100, 100), &SegmentConfig::default());
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].origin(), IVec2::new(60, 2));
    assert_eq!(clusters[1].origin(), IVec2::new(2, 50));
}

#[test]
fn test_small_components_are_noise() {
    let mut labels = blank(100, 100);
    // Extent 20 (21 cells) is not larger than 20.
    fill_rect(&mut labels, 0, 0, 21, 40, 9);
    // Tall but thin.
    fill_rect(&mut labels, 30, 0, 3, 90, 9);
    // Extent 21 both ways survives.
    fill_rect(&mut labels, 50, 50, 22, 22, 9);

    let clusters = segment(&labels, &blank(100, 100), &SegmentConfig::default());
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].bounds, Aabb::new(50, 71, 50, 71));
}

#[test]
fn test_wide_component_split_into_strips() {
    let mut labels = blank(1300, 40);
    fill_rect(&mut labels, 50, 5, 1200, 30, 4);
    // Mark a column pattern so concatenation order is checked.
    for y in 5..35 {
        labels[(50 + 499, y)] = 5;
        labels[(50 + 500, y)] = 6;
    }
    let image = smooth_texture(1300, 40, 8);

    let clusters = segment(&labels, &image, &SegmentConfig::default());
    let widths: Vec<usize> = clusters.iter().map(Cluster::width).collect();
    assert_eq!(widths, vec![500, 500, 200]);
    assert!(clusters.iter().all(|c| c.height() == 30));
    assert_eq!(clusters[0].origin(), IVec2::new(50, 5));
    assert_eq!(clusters[1].origin(), IVec2::new(550, 5));
    assert_eq!(clusters[2].origin(), IVec2::new(1050, 5));

    // Masks and contents concatenate back to the unsplit component.
    for y in 0..30 {
        let mask_row: Vec<u8> = clusters.iter().flat_map(|c| c.mask.row(y).to_vec()).collect();
        assert_eq!(mask_row.as_slice(), &labels.row(y + 5)[50..1250]);
        let content_row: Vec<u8> =
            clusters.iter().flat_map(|c| c.contents.row(y).to_vec()).collect();
        assert_eq!(content_row.as_slice(), &image.row(y + 5)[50..1250]);
    }
    assert_eq!(clusters[0].mask[(499, 0)], 5);
    assert_eq!(clusters[1].mask[(0, 0)], 6);
}

#[test]
fn test_exact_multiple_has_no_empty_remainder() {
    let mut labels = blank(1000, 30);
    fill_rect(&mut labels, 0, 0, 1000, 30, 1);
    let clusters = segment(&labels, &blank(1000, 30), &SegmentConfig::default());
    let widths: Vec<usize> = clusters.iter().map(Cluster::width).collect();
    assert_eq!(widths, vec![500, 500]);
}

#[test]
fn test_splitting_can_be_disabled() {
    let mut labels = blank(700, 30);
    fill_rect(&mut labels, 0, 0, 700, 30, 1);
    let config = SegmentConfig {
        strip_width: None,
        ..SegmentConfig::default()
    };
    let clusters = segment(&labels, &blank(700, 30), &config);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].width(), 700);
}

#[test]
fn test_mask_keeps_only_component_cells_and_ids() {
    // An L shape with a foreign blob inside its bounding box.
    let mut labels = blank(60, 60);
    fill_rect(&mut labels, 0, 0, 5, 50, 3);
    fill_rect(&mut labels, 0, 45, 50, 5, 3);
    fill_rect(&mut labels, 20, 10, 3, 3, 8);

    let clusters = segment(&labels, &blank(60, 60), &SegmentConfig::default());
    assert_eq!(clusters.len(), 1);
    let mask = &clusters[0].mask;
    assert_eq!((mask.width(), mask.height()), (50, 50));
    assert_eq!(mask[(2, 2)], 3);
    assert_eq!(mask[(40, 47)], 3);
    // Inside the box but not part of the component.
    assert_eq!(mask[(21, 11)], 0);
    assert_eq!(mask[(30, 20)], 0);
}

#[test]
fn test_flood_fill_partitions_foreground() {
    let image = smooth_texture(64, 64, 17);
    let labels = image.map(|&v| if v > 140 { 1 } else { 0 });
    let mut remaining = labels.map(|&v| v != 0);
    let mut owner: Buffer2<Option<usize>> = Buffer2::new_default(64, 64);
    let mut cursor = 0;
    let mut components = 0;

    while let Some(seed) = next_seed(&remaining, &mut cursor) {
        let (bounds, cells) = flood_fill(&mut remaining, seed);
        for &(x, y) in &cells {
            assert!(bounds.contains(x, y));
            assert_eq!(owner[(x, y)], None, "cell ({}, {}) claimed twice", x, y);
            owner[(x, y)] = Some(components);
        }
        components += 1;
    }

    assert!(components > 1);
    assert!(remaining.iter().all(|&v| !v));
    for y in 0..64 {
        for x in 0..64 {
            assert_eq!(owner[(x, y)].is_some(), labels[(x, y)] != 0);
        }
    }
}

#[test]
fn test_flood_fill_is_four_connected() {
    // Diagonal neighbors are separate components.
    let mut remaining = Buffer2::new(3, 3, vec![true, false, false, false, true, false, false, false, true]);
    let (bounds, cells) = flood_fill(&mut remaining, (0, 0));
    assert_eq!(cells, vec![(0, 0)]);
    assert_eq!(bounds, Aabb::seed(0, 0));
    assert!(remaining[(1, 1)]);
}

#[test]
fn test_empty_mask_has_no_clusters() {
    assert!(segment(&blank(50, 50), &blank(50, 50), &SegmentConfig::default()).is_empty());
    assert!(segment(&blank(0, 0), &blank(0, 0), &SegmentConfig::default()).is_empty());
}
