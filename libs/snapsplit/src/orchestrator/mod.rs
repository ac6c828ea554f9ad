//! # Orchestrator
//!
//! Owns the loaded source mesh and the current set of parts, and runs the
//! pipeline over them: segmentation, seam location, placement, synthesis.
//!
//! Every operation validates its whole input before the first boolean and
//! edits clones of the parts it touches; the part set is replaced only when
//! the operation succeeds.
//!
//! ```
//! use glam::DVec3;
//! use snapsplit::orchestrator::{ConnectRequest, Orchestrator, PlacementMode};
//! use snapsplit::segmentation::SplitRequest;
//! use snapsplit::{CancelToken, ConnectorKind};
//! use snapsplit_mesh::primitives::create_box;
//!
//! let mut orchestrator = Orchestrator::default();
//! orchestrator.set_source("block", create_box(DVec3::ZERO, DVec3::new(40.0, 20.0, 20.0)).unwrap());
//!
//! let cancel = CancelToken::new();
//! let split = orchestrator.split(&SplitRequest::new(DVec3::X, 2), &cancel).unwrap();
//! let ids: Vec<_> = split.parts.iter().map(|p| p.id()).collect();
//!
//! let request = ConnectRequest::new(ConnectorKind::CylindricalPin, PlacementMode::LineCount(1));
//! let results = orchestrator.connect(&ids, &request, &cancel).unwrap();
//! assert_eq!(results[0].succeeded, vec![0]);
//! ```

pub mod batch;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use config::constants::{
    DEFAULT_CONNECTORS_PER_SEAM, DEFAULT_MARGIN_PCT, DEFAULT_MATERIAL, PARTS_COLLECTION_NAME,
};
use config::pipeline::PipelineConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use snapsplit_mesh::{BspKernel, GeometryKernel, Mesh};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::collaborators::{GroupingService, MeshFormat, MeshIo};
use crate::connector::{ConnectorKind, ConnectorSpec, CrossSection};
use crate::error::{InputError, SelectionError, SnapSplitError, SnapSplitResult};
use crate::part::{Part, PartId, PartIds};
use crate::placement::{place_grid, place_line, place_line_count, place_manual, PlacementPlan};
use crate::seam::{locate_seam, SeamRegion};
use crate::segmentation::{CapReport, SegmentationEngine, SplitRequest, SplitResult};
use crate::synthesis::{ConnectResult, ConnectorSynthesizer};
use crate::tolerance::{resolve, BuiltinProfiles, ProfileStore, ResolvedTolerance};

// =============================================================================
// REQUESTS
// =============================================================================

/// The cut face a grid split divides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSelector {
    pub part: PartId,
    /// Index of the split plane the face lies on.
    pub plane: usize,
}

/// How connectors are laid out on each seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlacementMode {
    /// Along the seam, roughly `spacing` apart.
    Line { spacing: f64 },
    /// Along the seam, exactly this many.
    LineCount(usize),
    Grid { rows: usize, columns: usize },
    /// At caller-picked points, each assigned to the seam it lies on.
    Manual(Vec<DVec3>),
}

impl Default for PlacementMode {
    fn default() -> Self {
        PlacementMode::LineCount(DEFAULT_CONNECTORS_PER_SEAM)
    }
}

/// Parameters of [`Orchestrator::connect`].
///
/// Dimensions left as `None` take the connector kind's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub kind: ConnectorKind,
    pub placement: PlacementMode,
    pub material: String,
    /// Clearance per side in millimetres, replacing the profile default.
    pub tolerance_override: Option<f64>,
    pub margin_pct: f64,
    /// Cross-section in mesh units.
    pub section: Option<CrossSection>,
    /// Pin length in mesh units.
    pub length: Option<f64>,
    pub depth_fraction: Option<f64>,
}

impl ConnectRequest {
    pub fn new(kind: ConnectorKind, placement: PlacementMode) -> Self {
        Self {
            kind,
            placement,
            material: DEFAULT_MATERIAL.to_string(),
            tolerance_override: None,
            margin_pct: DEFAULT_MARGIN_PCT,
            section: None,
            length: None,
            depth_fraction: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn with_tolerance_override(mut self, per_side_mm: f64) -> Self {
        self.tolerance_override = Some(per_side_mm);
        self
    }

    pub fn with_margin(mut self, margin_pct: f64) -> Self {
        self.margin_pct = margin_pct;
        self
    }

    pub fn with_section(mut self, section: CrossSection) -> Self {
        self.section = Some(section);
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_depth_fraction(mut self, depth_fraction: f64) -> Self {
        self.depth_fraction = Some(depth_fraction);
        self
    }

    fn spec(&self, tolerance: &ResolvedTolerance, config: &PipelineConfig) -> Result<ConnectorSpec, InputError> {
        let mut spec = ConnectorSpec::defaults(self.kind, tolerance, config);
        if let Some(section) = self.section {
            spec = spec.with_section(section);
        }
        if let Some(length) = self.length {
            spec = spec.with_length(length);
        }
        if let Some(depth) = self.depth_fraction {
            spec = spec.with_depth_fraction(depth);
        }
        spec.validate()?;
        Ok(spec)
    }
}

/// A planned seam ready for synthesis.
#[derive(Debug, Clone)]
pub(crate) struct ConnectJob {
    pub male: PartId,
    pub female: PartId,
    pub plan: PlacementPlan,
    pub tolerance: ResolvedTolerance,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Runs the split-then-connect workflow over a set of parts.
pub struct Orchestrator {
    kernel: Box<dyn GeometryKernel>,
    profiles: Box<dyn ProfileStore>,
    grouping: Option<Box<dyn GroupingService>>,
    config: PipelineConfig,
    source: Option<(String, Mesh)>,
    parts: BTreeMap<PartId, Part>,
    ids: PartIds,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Orchestrator {
    /// An orchestrator with the BSP kernel and the built-in profiles.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            kernel: Box::new(BspKernel::from_config(&config)),
            profiles: Box::new(BuiltinProfiles::default()),
            grouping: None,
            config,
            source: None,
            parts: BTreeMap::new(),
            ids: PartIds::default(),
        }
    }

    pub fn with_kernel(mut self, kernel: Box<dyn GeometryKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_profiles(mut self, profiles: Box<dyn ProfileStore>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Registers every split result with `grouping`.
    pub fn with_grouping(mut self, grouping: Box<dyn GroupingService>) -> Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name and mesh of the loaded source.
    pub fn source(&self) -> Option<(&str, &Mesh)> {
        self.source.as_ref().map(|(name, mesh)| (name.as_str(), mesh))
    }

    /// Current parts in id order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    // -------------------------------------------------------------------------
    // Source
    // -------------------------------------------------------------------------

    /// Loads the source mesh through `io`.
    ///
    /// # Errors
    ///
    /// [`SnapSplitError::Collaborator`] when the collaborator fails.
    pub fn load(&mut self, io: &dyn MeshIo) -> SnapSplitResult<()> {
        let (name, mesh) = io.load_mesh().map_err(|err| SnapSplitError::Collaborator {
            service: "mesh I/O",
            message: err.to_string(),
        })?;
        self.set_source(name, mesh);
        Ok(())
    }

    /// Replaces the source mesh. Existing parts are kept until the next
    /// split.
    pub fn set_source(&mut self, name: impl Into<String>, mesh: Mesh) {
        let name = name.into();
        debug!(source = %name, triangles = mesh.triangle_count(), "source set");
        self.source = Some((name, mesh));
    }

    // -------------------------------------------------------------------------
    // Segmentation
    // -------------------------------------------------------------------------

    /// Splits the source mesh. The new parts replace the current set.
    ///
    /// # Errors
    ///
    /// [`InputError::NoSource`] without a source, otherwise as
    /// [`SegmentationEngine::planar_split`]; a failing grouping service is
    /// reported as [`SnapSplitError::Collaborator`]. The part set is
    /// unchanged on error.
    pub fn split(&mut self, request: &SplitRequest, cancel: &CancelToken) -> SnapSplitResult<SplitResult> {
        let (name, mesh) = self.source.as_ref().ok_or(InputError::NoSource)?;
        let engine = SegmentationEngine::new(self.kernel.as_ref(), self.config);
        let result = engine.planar_split(name, mesh, request, &mut self.ids, cancel)?;

        self.register(&result.parts)?;
        self.parts = result
            .parts
            .iter()
            .map(|part| (part.id(), part.clone()))
            .collect();
        info!(parts = self.parts.len(), "parts replaced");
        Ok(result)
    }

    /// Divides one cut face of a part into a grid of parts. The cells
    /// replace the part.
    ///
    /// # Errors
    ///
    /// [`SelectionError::UnknownPart`] for an unknown id, otherwise as
    /// [`SegmentationEngine::grid_split`].
    pub fn grid_split(
        &mut self,
        face: FaceSelector,
        rows: usize,
        columns: usize,
        cancel: &CancelToken,
    ) -> SnapSplitResult<SplitResult> {
        let part = self
            .parts
            .get(&face.part)
            .ok_or(SelectionError::UnknownPart(face.part))?;
        let engine = SegmentationEngine::new(self.kernel.as_ref(), self.config);
        let result = engine.grid_split(part, face.plane, rows, columns, &mut self.ids, cancel)?;

        self.register(&result.parts)?;
        self.parts.remove(&face.part);
        self.parts
            .extend(result.parts.iter().map(|part| (part.id(), part.clone())));
        Ok(result)
    }

    /// Caps every open seam of a part.
    ///
    /// # Errors
    ///
    /// [`SelectionError::UnknownPart`], otherwise as
    /// [`SegmentationEngine::cap_part`].
    pub fn cap_part(&mut self, id: PartId) -> SnapSplitResult<Vec<CapReport>> {
        let part = self.parts.get(&id).ok_or(SelectionError::UnknownPart(id))?;
        let engine = SegmentationEngine::new(self.kernel.as_ref(), self.config);
        let (capped, reports) = engine.cap_part(part)?;
        self.parts.insert(id, capped);
        Ok(reports)
    }

    fn register(&self, parts: &[Part]) -> SnapSplitResult<()> {
        let Some(grouping) = &self.grouping else {
            return Ok(());
        };
        let ids: Vec<PartId> = parts.iter().map(Part::id).collect();
        grouping
            .register_parts(PARTS_COLLECTION_NAME, &ids)
            .map_err(|err| SnapSplitError::Collaborator {
                service: "grouping",
                message: err.to_string(),
            })
    }

    // -------------------------------------------------------------------------
    // Connectors
    // -------------------------------------------------------------------------

    /// Synthesizes connectors on every seam shared by the selected parts.
    ///
    /// Seams are connected in plane order, A (the part below the seam
    /// plane) receiving the pins. Manual points are assigned to the seam
    /// they lie on; points on no seam are reported in the first result.
    ///
    /// # Errors
    ///
    /// Selection, tolerance and placement errors are reported before any
    /// boolean runs. Failed connectors are listed per result instead.
    /// Cancellation leaves every part unchanged.
    pub fn connect(
        &mut self,
        part_ids: &[PartId],
        request: &ConnectRequest,
        cancel: &CancelToken,
    ) -> SnapSplitResult<Vec<ConnectResult>> {
        let jobs = self.plan_selection(part_ids, request)?;

        let mut working: BTreeMap<PartId, Part> = BTreeMap::new();
        for job in &jobs {
            for id in [job.male, job.female] {
                if let Some(part) = self.parts.get(&id) {
                    working.entry(id).or_insert_with(|| part.clone());
                }
            }
        }

        let synthesizer = ConnectorSynthesizer::new(self.kernel.as_ref());
        let mut results = Vec::with_capacity(jobs.len());
        for job in &jobs {
            cancel.check()?;
            let (Some(mut male), Some(mut female)) = (working.remove(&job.male), working.remove(&job.female)) else {
                return Err(SelectionError::NotAdjacent {
                    a: job.male,
                    b: job.female,
                }
                .into());
            };
            let result = synthesizer.synthesize(&mut male, &mut female, &job.plan, &job.tolerance, cancel);
            working.insert(job.male, male);
            working.insert(job.female, female);
            results.push(result?);
        }

        self.parts.extend(working);
        Ok(results)
    }

    /// Connects each pair on its own seam, running pairs that share no part
    /// in parallel on `worker_threads` threads.
    ///
    /// # Errors
    ///
    /// As [`connect`](Self::connect); [`SelectionError::Overlapping`] for a
    /// pair naming the same part twice. Nothing is committed unless every
    /// pair finished.
    pub fn connect_batch(
        &mut self,
        pairs: &[(PartId, PartId)],
        request: &ConnectRequest,
        cancel: &CancelToken,
    ) -> SnapSplitResult<Vec<ConnectResult>> {
        let tolerance = self.resolve_tolerance(request)?;
        let spec = request.spec(&tolerance, &self.config)?;
        let mut jobs = Vec::with_capacity(pairs.len());
        for &(a, b) in pairs {
            if a == b {
                return Err(SelectionError::Overlapping(a).into());
            }
            let first = self.selected(a)?;
            let second = self.selected(b)?;
            let seam = locate_seam(first, second, self.seam_tolerance())
                .ok_or(SelectionError::NotAdjacent { a, b })?;
            let plan = match &request.placement {
                PlacementMode::Manual(points) => place_manual(&seam, points, &spec)?,
                mode => plan_seam(&seam, mode, request.margin_pct, &spec)?,
            };
            jobs.push(ConnectJob {
                male: seam.a,
                female: seam.b,
                plan,
                tolerance,
            });
        }
        info!(pairs = jobs.len(), threads = self.config.worker_threads, "batch connect");
        batch::run_waves(
            self.kernel.as_ref(),
            self.config.worker_threads,
            &mut self.parts,
            jobs,
            cancel,
        )
    }

    /// Exports every part through `io` and returns how many were written.
    ///
    /// # Errors
    ///
    /// [`SnapSplitError::Collaborator`] on the first failed export.
    pub fn export_parts(&self, io: &dyn MeshIo, format: MeshFormat) -> SnapSplitResult<usize> {
        for part in self.parts.values() {
            io.export_mesh(part.name(), part.mesh(), format)
                .map_err(|err| SnapSplitError::Collaborator {
                    service: "mesh I/O",
                    message: format!("{}: {err}", part.name()),
                })?;
        }
        info!(parts = self.parts.len(), %format, "parts exported");
        Ok(self.parts.len())
    }

    // -------------------------------------------------------------------------
    // Planning
    // -------------------------------------------------------------------------

    fn plan_selection(&self, part_ids: &[PartId], request: &ConnectRequest) -> SnapSplitResult<Vec<ConnectJob>> {
        let mut selection: Vec<PartId> = part_ids.to_vec();
        selection.sort();
        selection.dedup();
        if selection.len() < 2 {
            return Err(SelectionError::TooFewParts(selection.len()).into());
        }
        let parts = selection
            .iter()
            .map(|&id| self.selected(id))
            .collect::<SnapSplitResult<Vec<&Part>>>()?;

        let tolerance = self.resolve_tolerance(request)?;
        let spec = request.spec(&tolerance, &self.config)?;

        let mut seams: Vec<SeamRegion> = Vec::new();
        for (i, first) in parts.iter().enumerate() {
            for second in &parts[i + 1..] {
                if let Some(seam) = locate_seam(first, second, self.seam_tolerance()) {
                    seams.push(seam);
                }
            }
        }
        if seams.is_empty() {
            return Err(match selection.as_slice() {
                [a, b] => SelectionError::NotAdjacent { a: *a, b: *b },
                _ => SelectionError::NoSeams,
            }
            .into());
        }
        seams.sort_by_key(|seam| (seam.plane.index, seam.a, seam.b));
        debug!(seams = seams.len(), "seams located");

        let plans = match &request.placement {
            PlacementMode::Manual(points) => plan_manual(&seams, points, &spec)?,
            mode => seams
                .iter()
                .map(|seam| plan_seam(seam, mode, request.margin_pct, &spec).map(|plan| (seam, plan)))
                .collect::<SnapSplitResult<Vec<_>>>()?,
        };
        Ok(plans
            .into_iter()
            .map(|(seam, plan)| ConnectJob {
                male: seam.a,
                female: seam.b,
                plan,
                tolerance,
            })
            .collect())
    }

    fn selected(&self, id: PartId) -> SnapSplitResult<&Part> {
        let part = self.parts.get(&id).ok_or(SelectionError::UnknownPart(id))?;
        if part.is_open() {
            return Err(InputError::OpenSeams(id).into());
        }
        Ok(part)
    }

    fn resolve_tolerance(&self, request: &ConnectRequest) -> SnapSplitResult<ResolvedTolerance> {
        Ok(resolve(
            self.profiles.as_ref(),
            &request.material,
            request.tolerance_override,
        )?)
    }

    fn seam_tolerance(&self) -> f64 {
        self.config.plane_epsilon.max(self.config.weld_epsilon)
    }
}

/// Line or grid plan for one seam.
fn plan_seam(
    seam: &SeamRegion,
    mode: &PlacementMode,
    margin_pct: f64,
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    match mode {
        PlacementMode::Line { spacing } => place_line(seam, margin_pct, *spacing, spec),
        PlacementMode::LineCount(count) => place_line_count(seam, margin_pct, *count, spec),
        PlacementMode::Grid { rows, columns } => place_grid(seam, margin_pct, *rows, *columns, spec),
        PlacementMode::Manual(points) => place_manual(seam, points, spec),
    }
}

/// Sends each point to the seam whose plane is nearest among those whose
/// region contains its projection. Seams without points get no plan.
fn plan_manual<'s>(
    seams: &'s [SeamRegion],
    points: &[DVec3],
    spec: &ConnectorSpec,
) -> SnapSplitResult<Vec<(&'s SeamRegion, PlacementPlan)>> {
    let mut assigned: Vec<Vec<DVec3>> = vec![Vec::new(); seams.len()];
    let mut stray = Vec::new();
    for &point in points {
        let target = seams
            .iter()
            .enumerate()
            .filter(|(_, seam)| seam.contains(seam.project(point)))
            .min_by(|(_, a), (_, b)| {
                let da = a.plane.signed_distance(point).abs();
                let db = b.plane.signed_distance(point).abs();
                da.total_cmp(&db)
            })
            .map(|(index, _)| index);
        match target {
            Some(index) => assigned[index].push(point),
            None => {
                warn!(x = point.x, y = point.y, z = point.z, "point on no seam rejected");
                stray.push(point);
            }
        }
    }

    let mut plans = Vec::new();
    for (seam, seam_points) in seams.iter().zip(&assigned) {
        if seam_points.is_empty() {
            continue;
        }
        plans.push((seam, place_manual(seam, seam_points, spec)?));
    }
    match plans.first_mut() {
        Some((_, plan)) => plan.rejected.extend(stray),
        None => return Err(SelectionError::NoPointsInSeam(points.len()).into()),
    }
    Ok(plans)
}
