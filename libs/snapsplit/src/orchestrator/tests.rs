//! Tests for the orchestrator.

use std::sync::Arc;

use approx::assert_relative_eq;
use snapsplit_mesh::ops::validate::is_manifold;
use snapsplit_mesh::primitives::{circle_outline, create_box, create_loft, Station};

use super::*;
use crate::collaborators::{InMemoryGrouping, InMemoryMeshIo};
use crate::error::ToleranceError;
use crate::tolerance::ToleranceProfile;

// =============================================================================
// FIXTURES
// =============================================================================

/// 90×40×40 block, split into thirds along X when `count` is 3.
fn split_block(count: usize) -> (Orchestrator, Vec<PartId>) {
    let mut orchestrator = Orchestrator::default();
    orchestrator.set_source("block", create_box(DVec3::ZERO, DVec3::new(90.0, 40.0, 40.0)).unwrap());
    let result = orchestrator
        .split(&SplitRequest::new(DVec3::X, count), &CancelToken::new())
        .unwrap();
    let ids = result.parts.iter().map(Part::id).collect();
    (orchestrator, ids)
}

/// 32-sided cylinder (r = 20, h = 60) split along Z.
fn split_cylinder(count: usize) -> (Orchestrator, Vec<PartId>) {
    let ring = circle_outline(20.0, 32);
    let cylinder = create_loft(&[Station::new(0.0, ring.clone()), Station::new(60.0, ring)]).unwrap();
    let mut orchestrator = Orchestrator::default();
    orchestrator.set_source("cylinder", cylinder);
    let result = orchestrator
        .split(&SplitRequest::new(DVec3::Z, count), &CancelToken::new())
        .unwrap();
    let ids = result.parts.iter().map(Part::id).collect();
    (orchestrator, ids)
}

fn pin_request(placement: PlacementMode) -> ConnectRequest {
    ConnectRequest::new(ConnectorKind::CylindricalPin, placement)
}

fn snapshot(orchestrator: &Orchestrator) -> Vec<Part> {
    orchestrator.parts().cloned().collect()
}

// =============================================================================
// SPLITTING
// =============================================================================

#[test]
fn test_split_without_source() {
    let mut orchestrator = Orchestrator::default();
    let err = orchestrator
        .split(&SplitRequest::new(DVec3::X, 2), &CancelToken::new())
        .unwrap_err();
    assert_eq!(err, SnapSplitError::Input(InputError::NoSource));
}

#[test]
fn test_load_then_split_registers_parts() {
    let grouping = Arc::new(InMemoryGrouping::default());
    let io = InMemoryMeshIo::with_source("block", create_box(DVec3::ZERO, DVec3::new(60.0, 20.0, 20.0)).unwrap());
    let mut orchestrator = Orchestrator::default().with_grouping(Box::new(Arc::clone(&grouping)));
    orchestrator.load(&io).unwrap();
    assert_eq!(orchestrator.source().map(|(name, _)| name), Some("block"));

    let result = orchestrator
        .split(&SplitRequest::new(DVec3::X, 2), &CancelToken::new())
        .unwrap();
    let ids: Vec<PartId> = result.parts.iter().map(Part::id).collect();
    assert_eq!(grouping.members(PARTS_COLLECTION_NAME), ids);
    assert_eq!(orchestrator.parts().count(), 2);
}

#[test]
fn test_resplit_replaces_parts() {
    let (mut orchestrator, first) = split_block(3);
    let result = orchestrator
        .split(&SplitRequest::new(DVec3::X, 2), &CancelToken::new())
        .unwrap();
    assert_eq!(orchestrator.parts().count(), 2);
    for id in &first {
        assert!(orchestrator.part(*id).is_none());
    }
    assert!(result.parts.iter().all(|p| !first.contains(&p.id())));
}

#[test]
fn test_failed_split_keeps_parts() {
    let (mut orchestrator, ids) = split_block(2);
    let err = orchestrator
        .split(&SplitRequest::new(DVec3::X, 1), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, SnapSplitError::Input(InputError::InvalidCount { .. })));
    let kept: Vec<PartId> = orchestrator.parts().map(Part::id).collect();
    assert_eq!(kept, ids);
}

#[test]
fn test_grid_split_replaces_parent() {
    let (mut orchestrator, ids) = split_block(2);
    let result = orchestrator
        .grid_split(FaceSelector { part: ids[0], plane: 0 }, 2, 2, &CancelToken::new())
        .unwrap();
    assert_eq!(result.parts.len(), 4);
    assert!(orchestrator.part(ids[0]).is_none());
    assert!(orchestrator.part(ids[1]).is_some());
    assert_eq!(orchestrator.parts().count(), 5);
    assert_eq!(result.parts[0].name(), "block_P1_R1C1");
}

#[test]
fn test_grid_split_unknown_part() {
    let (mut orchestrator, _) = split_block(2);
    let err = orchestrator
        .grid_split(FaceSelector { part: PartId(99), plane: 0 }, 2, 2, &CancelToken::new())
        .unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::UnknownPart(PartId(99))));
}

// =============================================================================
// CONNECTING
// =============================================================================

#[test]
fn test_connect_pair_with_line_count() {
    let (mut orchestrator, ids) = split_block(2);
    let before = orchestrator.part(ids[0]).unwrap().mesh().signed_volume();

    let results = orchestrator
        .connect(&ids, &pin_request(PlacementMode::LineCount(2)), &CancelToken::new())
        .unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!((result.male, result.female), (ids[0], ids[1]));
    assert_eq!(result.succeeded, vec![0, 1]);
    assert_relative_eq!(result.tolerance.per_side_mm, 0.20);

    let male = orchestrator.part(ids[0]).unwrap();
    let female = orchestrator.part(ids[1]).unwrap();
    assert!(is_manifold(male.mesh()));
    assert!(is_manifold(female.mesh()));
    assert!(male.mesh().signed_volume() > before);
}

#[test]
fn test_default_placement_places_three_per_seam() {
    let (mut orchestrator, ids) = split_block(2);
    let results = orchestrator
        .connect(&ids, &pin_request(PlacementMode::default()), &CancelToken::new())
        .unwrap();
    assert_eq!(results[0].succeeded, vec![0, 1, 2]);
}

#[test]
fn test_connect_three_parts_connects_both_seams() {
    let (mut orchestrator, ids) = split_block(3);
    let results = orchestrator
        .connect(&ids, &pin_request(PlacementMode::LineCount(1)), &CancelToken::new())
        .unwrap();
    let seams: Vec<(usize, PartId, PartId)> = results.iter().map(|r| (r.plane, r.male, r.female)).collect();
    assert_eq!(seams, vec![(0, ids[0], ids[1]), (1, ids[1], ids[2])]);
    assert!(results.iter().all(ConnectResult::is_complete));
}

#[test]
fn test_cylinder_thirds_take_every_kind() {
    for kind in [
        ConnectorKind::CylindricalPin,
        ConnectorKind::RectangularTenon,
        ConnectorKind::SnapPin,
        ConnectorKind::SnapTenon,
    ] {
        let (mut orchestrator, ids) = split_cylinder(3);
        let request = ConnectRequest::new(kind, PlacementMode::LineCount(3)).with_margin(20.0);
        let results = orchestrator.connect(&ids, &request, &CancelToken::new()).unwrap();
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(result.succeeded, vec![0, 1, 2], "{kind:?} on plane {}: {:?}", result.plane, result.failed);
        }
        for id in &ids {
            assert!(is_manifold(orchestrator.part(*id).unwrap().mesh()), "{kind:?} left {id} open");
        }
    }
}

#[test]
fn test_grid_on_cylinder_drops_corners() {
    let (mut orchestrator, ids) = split_cylinder(2);
    let results = orchestrator
        .connect(&ids, &pin_request(PlacementMode::Grid { rows: 3, columns: 3 }), &CancelToken::new())
        .unwrap();
    assert_eq!(results[0].succeeded.len(), 5);
    assert_eq!(results[0].rejected_points.len(), 4);
    for corner in &results[0].rejected_points {
        assert!(corner.truncate().length() > 20.0);
    }

    let before = snapshot(&orchestrator);
    let err = orchestrator
        .connect(&ids, &pin_request(PlacementMode::Grid { rows: 2, columns: 2 }), &CancelToken::new())
        .unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::NoFittingPositions(4)));
    assert_eq!(snapshot(&orchestrator), before);
}

#[test]
fn test_connect_selection_errors() {
    let (mut orchestrator, ids) = split_block(3);
    let request = pin_request(PlacementMode::LineCount(1));
    let cancel = CancelToken::new();

    let err = orchestrator.connect(&[ids[0], ids[0]], &request, &cancel).unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::TooFewParts(1)));

    let err = orchestrator.connect(&[ids[0], PartId(42)], &request, &cancel).unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::UnknownPart(PartId(42))));

    let err = orchestrator.connect(&[ids[0], ids[2]], &request, &cancel).unwrap_err();
    assert_eq!(
        err,
        SnapSplitError::Selection(SelectionError::NotAdjacent { a: ids[0], b: ids[2] })
    );
}

#[test]
fn test_unknown_material_mutates_nothing() {
    let (mut orchestrator, ids) = split_block(2);
    let before = snapshot(&orchestrator);
    let request = pin_request(PlacementMode::LineCount(1)).with_material("Oak");
    let err = orchestrator.connect(&ids, &request, &CancelToken::new()).unwrap_err();
    assert_eq!(
        err,
        SnapSplitError::Tolerance(ToleranceError::UnknownMaterial("Oak".to_string()))
    );
    assert_eq!(snapshot(&orchestrator), before);
}

#[test]
fn test_tight_grid_is_rejected_before_booleans() {
    let (mut orchestrator, ids) = split_block(2);
    let before = snapshot(&orchestrator);
    let request = pin_request(PlacementMode::Grid { rows: 1, columns: 8 });
    let err = orchestrator.connect(&ids, &request, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SnapSplitError::Input(InputError::SpacingTooTight { .. })));
    assert_eq!(snapshot(&orchestrator), before);
}

#[test]
fn test_manual_points_report_strays() {
    let (mut orchestrator, ids) = split_block(2);
    let stray = DVec3::new(45.0, 80.0, 20.0);
    let request = pin_request(PlacementMode::Manual(vec![DVec3::new(45.0, 20.0, 20.0), stray]));
    let results = orchestrator.connect(&ids, &request, &CancelToken::new()).unwrap();
    assert_eq!(results[0].succeeded, vec![0]);
    assert_eq!(results[0].rejected_points, vec![stray]);
}

#[test]
fn test_manual_points_all_outside() {
    let (mut orchestrator, ids) = split_block(2);
    let request = pin_request(PlacementMode::Manual(vec![DVec3::new(45.0, 80.0, 20.0)]));
    let err = orchestrator.connect(&ids, &request, &CancelToken::new()).unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::NoPointsInSeam(1)));
}

#[test]
fn test_cancelled_connect_mutates_nothing() {
    let (mut orchestrator, ids) = split_block(2);
    let before = snapshot(&orchestrator);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = orchestrator
        .connect(&ids, &pin_request(PlacementMode::LineCount(1)), &cancel)
        .unwrap_err();
    assert_eq!(err, SnapSplitError::Cancelled);
    assert_eq!(snapshot(&orchestrator), before);
}

#[test]
fn test_open_parts_must_be_capped_first() {
    let mut orchestrator = Orchestrator::default();
    orchestrator.set_source("block", create_box(DVec3::ZERO, DVec3::new(60.0, 20.0, 20.0)).unwrap());
    let cancel = CancelToken::new();
    let split = orchestrator
        .split(&SplitRequest::new(DVec3::X, 2).with_caps(false), &cancel)
        .unwrap();
    let ids: Vec<PartId> = split.parts.iter().map(Part::id).collect();
    let request = pin_request(PlacementMode::LineCount(1));

    let err = orchestrator.connect(&ids, &request, &cancel).unwrap_err();
    assert_eq!(err, SnapSplitError::Input(InputError::OpenSeams(ids[0])));

    for id in &ids {
        let reports = orchestrator.cap_part(*id).unwrap();
        assert_eq!(reports.len(), 1);
    }
    let results = orchestrator.connect(&ids, &request, &cancel).unwrap();
    assert!(results[0].is_complete());
}

// =============================================================================
// BATCH AND EXPORT
// =============================================================================

#[test]
fn test_connect_batch_matches_sequential() {
    let (mut batch, ids) = split_block(3);
    let (mut sequential, _) = split_block(3);
    let request = pin_request(PlacementMode::LineCount(1));
    let cancel = CancelToken::new();

    let pairs = [(ids[0], ids[1]), (ids[1], ids[2])];
    let batched = batch.connect_batch(&pairs, &request, &cancel).unwrap();
    let serial = sequential.connect(&ids, &request, &cancel).unwrap();
    assert_eq!(batched, serial);
    assert_eq!(snapshot(&batch), snapshot(&sequential));
}

#[test]
fn test_custom_kernel_profiles_and_pool() {
    let config = PipelineConfig::default().with_worker_threads(2);
    let profiles = BuiltinProfiles::default().with_profile(ToleranceProfile::new("PA12", 0.1, 0.15, 0.2).unwrap());
    let mut orchestrator = Orchestrator::new(config)
        .with_kernel(Box::new(BspKernel::from_config(&config)))
        .with_profiles(Box::new(profiles));
    orchestrator.set_source("block", create_box(DVec3::ZERO, DVec3::new(90.0, 40.0, 40.0)).unwrap());
    let split = orchestrator
        .split(&SplitRequest::new(DVec3::X, 3), &CancelToken::new())
        .unwrap();
    let ids: Vec<PartId> = split.parts.iter().map(Part::id).collect();

    let request = pin_request(PlacementMode::LineCount(1)).with_material("PA12");
    let pairs = [(ids[0], ids[1]), (ids[1], ids[2])];
    let results = orchestrator.connect_batch(&pairs, &request, &CancelToken::new()).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.tolerance.per_side_mm == 0.15));
}

#[test]
fn test_connect_batch_rejects_self_pair() {
    let (mut orchestrator, ids) = split_block(2);
    let err = orchestrator
        .connect_batch(&[(ids[0], ids[0])], &pin_request(PlacementMode::LineCount(1)), &CancelToken::new())
        .unwrap_err();
    assert_eq!(err, SnapSplitError::Selection(SelectionError::Overlapping(ids[0])));
}

#[test]
fn test_export_parts() {
    let (orchestrator, _) = split_block(3);
    let io = InMemoryMeshIo::default();
    assert_eq!(orchestrator.export_parts(&io, MeshFormat::Stl).unwrap(), 3);
    let names: Vec<String> = io.exported().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["block_P1", "block_P2", "block_P3"]);
}
