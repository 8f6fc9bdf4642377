//! Tests for BoundingBox operations.

use window_common::bbox::BoundingBox;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-124.5, 32.5, -114.1, 42.0);
    assert_eq!(bbox.min_x, -124.5);
    assert_eq!(bbox.min_y, 32.5);
    assert_eq!(bbox.max_x, -114.1);
    assert_eq!(bbox.max_y, 42.0);
}

// ============================================================================
// Point containment tests
// ============================================================================

#[test]
fn test_contains_point_interior_and_edges() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(5.0, 5.0));
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(bbox.contains_point(0.0, 7.0));
}

#[test]
fn test_contains_point_outside() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(!bbox.contains_point(-0.01, 5.0));
    assert!(!bbox.contains_point(5.0, 10.01));
}

// ============================================================================
// Intersection tests
// ============================================================================

#[test]
fn test_contained_box_intersection_is_inner_box() {
    let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let inner = BoundingBox::new(2.0, 3.0, 4.0, 5.0);
    assert_eq!(outer.intersection(&inner), Some(inner));
}

#[test]
fn test_disjoint_boxes_have_no_intersection() {
    let a = BoundingBox::new(-125.0, 32.0, -114.0, 42.0);
    let b = BoundingBox::new(-80.0, 25.0, -70.0, 35.0);
    assert!(!a.intersects(&b));
    assert_eq!(a.intersection(&b), None);
}
