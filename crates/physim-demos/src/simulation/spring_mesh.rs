//! A 2D lattice of particles joined by Hooke springs.
//!
//! Particles are stored row-major, `index = y * mesh_width + x`. Springs are
//! implied by lattice adjacency; no connectivity table is kept.

use physim_core::prelude::*;
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::{PI, SQRT_2};

/// Record field indices.
pub mod field {
    /// Position x.
    pub const X: usize = 0;
    /// Position y.
    pub const Y: usize = 1;
    /// Velocity x.
    pub const VX: usize = 2;
    /// Velocity y.
    pub const VY: usize = 3;
}

/// Lattice particles: `(x, y, vx, vy)`.
pub type MeshParticles = ParticleBuffer<4>;

/// Which lattice neighbors are joined by springs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Left, right, up, down. Edge particles are held fixed.
    #[default]
    Orthogonal,
    /// Orthogonal plus diagonal neighbors. Edge particles move, with the
    /// springs that would leave the lattice removed.
    Full,
}

/// Neighbor offsets in the order forces are accumulated.
const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Parameters for the spring mesh demo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpringParams {
    /// Lattice columns.
    pub mesh_width: usize,
    /// Lattice rows.
    pub mesh_height: usize,
    /// Rest length of orthogonal springs (diagonals use `√2` times this).
    pub rest_length: f32,
    /// Spring constant.
    pub stiffness: f32,
    /// Constant added to every moving particle's vertical velocity per step.
    pub gravity: f32,
    /// Optional lower boundary (screen y grows downward) that reflects particles.
    pub floor: Option<f32>,
    /// Spring topology.
    pub connectivity: Connectivity,
    /// Trail fade factor per frame.
    pub fade: f32,
    /// Row driven by a cosine oscillation, if any.
    pub drive_row: Option<usize>,
    /// Drive period in frames.
    pub drive_period: f32,
    /// Drive amplitude as a fraction of the row spacing.
    pub drive_amplitude: f32,
    /// Initial position jitter.
    pub jitter: f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            mesh_width: 32,
            mesh_height: 32,
            rest_length: 2.834_645_7,
            stiffness: 0.02,
            gravity: 0.0,
            floor: None,
            connectivity: Connectivity::Orthogonal,
            fade: 0.977,
            drive_row: Some(1),
            drive_period: 70.0,
            drive_amplitude: 0.4,
            jitter: 0.2,
        }
    }
}

impl SpringParams {
    /// Set the lattice size.
    pub fn with_mesh(mut self, width: usize, height: usize) -> Self {
        self.mesh_width = width;
        self.mesh_height = height;
        self
    }

    /// Set the spring topology.
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Set per-step gravity and an optional reflecting floor.
    pub fn with_gravity(mut self, gravity: f32, floor: Option<f32>) -> Self {
        self.gravity = gravity;
        self.floor = floor;
        self
    }

    /// Disable the driven row.
    pub fn without_drive(mut self) -> Self {
        self.drive_row = None;
        self
    }
}

/// Force on the particle at `r0` from a spring to `r1`.
///
/// Positive when stretched (pulls toward `r1`), negative when compressed.
/// A zero-length spring has no direction and contributes nothing.
#[inline]
pub fn spring_force(r0: [f32; 2], r1: [f32; 2], rest_length: f32, stiffness: f32) -> [f32; 2] {
    let dr = [r1[0] - r0[0], r1[1] - r0[1]];
    let len = (dr[0] * dr[0] + dr[1] * dr[1]).sqrt();
    if len == 0.0 {
        return [0.0, 0.0];
    }
    let f = (len - rest_length) * stiffness / len;
    [f * dr[0], f * dr[1]]
}

/// The spring update over a lattice snapshot.
pub struct SpringMesh<'a> {
    input: &'a MeshParticles,
    width: usize,
    height: usize,
    params: &'a SpringParams,
}

impl<'a> SpringMesh<'a> {
    /// Bind the rule to a lattice snapshot.
    ///
    /// # Panics
    /// Panics if the buffer does not hold `mesh_width × mesh_height` particles.
    pub fn new(input: &'a MeshParticles, params: &'a SpringParams) -> Self {
        let (width, height) = (params.mesh_width, params.mesh_height);
        assert_eq!(
            input.len(),
            width * height,
            "mesh buffer does not match a {width}x{height} lattice"
        );
        Self {
            input,
            width,
            height,
            params,
        }
    }

    #[inline]
    fn position(&self, x: usize, y: usize) -> [f32; 2] {
        let r = self.input.record(y * self.width + x);
        [r[field::X], r[field::Y]]
    }

    /// Look up a neighbor with lattice clamping.
    ///
    /// Returns `None` when clamping changed the requested coordinates, which
    /// masks out springs that would reach past the edge (or back to the
    /// particle itself).
    #[inline]
    fn neighbor(&self, x: usize, y: usize, (dx, dy): (isize, isize)) -> Option<[f32; 2]> {
        let want_x = x as isize + dx;
        let want_y = y as isize + dy;
        let nx = want_x.clamp(0, self.width as isize - 1);
        let ny = want_y.clamp(0, self.height as isize - 1);
        (nx == want_x && ny == want_y).then(|| self.position(nx as usize, ny as usize))
    }

    /// Net spring force on the particle at lattice (x, y).
    pub fn force(&self, x: usize, y: usize) -> [f32; 2] {
        let r0 = self.position(x, y);
        let rest = self.params.rest_length;
        let k = self.params.stiffness;

        let mut total = [0.0f32; 2];
        let mut add = |offset: (isize, isize), rest_length: f32| {
            if let Some(r1) = self.neighbor(x, y, offset) {
                let f = spring_force(r0, r1, rest_length, k);
                total[0] += f[0];
                total[1] += f[1];
            }
        };

        for offset in ORTHOGONAL {
            add(offset, rest);
        }
        if self.params.connectivity == Connectivity::Full {
            for offset in DIAGONAL {
                add(offset, rest * SQRT_2);
            }
        }
        total
    }

    fn is_edge(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }
}

impl ParticleRule<4> for SpringMesh<'_> {
    fn len(&self) -> usize {
        self.input.len()
    }

    fn eval(&self, index: usize) -> [f32; 4] {
        let (x, y) = (index % self.width, index / self.width);
        let record = *self.input.record(index);

        if self.params.connectivity == Connectivity::Orthogonal && self.is_edge(x, y) {
            return record;
        }

        let [fx, fy] = self.force(x, y);
        let [px, py, vx, vy] = record;
        let mut out = [
            px + vx + fx,
            py + vy + fy,
            vx + fx,
            vy + fy + self.params.gravity,
        ];

        if let Some(floor) = self.params.floor {
            if out[field::Y] > floor {
                out[field::Y] = 2.0 * floor - out[field::Y];
                out[field::VY] = -out[field::VY];
            }
        }
        out
    }
}

/// Cosine oscillation imposed on one lattice row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringDrive {
    /// Driven row.
    pub row: usize,
    /// Rest height of the row.
    pub base_y: f32,
    /// Peak displacement.
    pub amplitude: f32,
    /// Period in frames.
    pub period: f32,
}

impl SpringDrive {
    /// Height of the driven row at `frame`.
    pub fn height_at(&self, frame: u64) -> f32 {
        self.base_y + self.amplitude * (2.0 * PI * frame as f32 / self.period).cos()
    }

    /// Set the y position of the row's interior particles for `frame`.
    pub fn apply(&self, particles: &mut MeshParticles, mesh_width: usize, frame: u64) {
        let y = self.height_at(frame);
        for x in 1..mesh_width.saturating_sub(1) {
            particles.write(self.row * mesh_width + x, field::Y, y);
        }
    }
}

/// Screen placement of the lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshLayout {
    /// X of column 0.
    pub left: f32,
    /// Y of row 0.
    pub top: f32,
    /// Column spacing.
    pub step_x: f32,
    /// Row spacing.
    pub step_y: f32,
}

impl MeshLayout {
    /// A square block half the screen height tall, centered horizontally.
    pub fn centered(screen_width: usize, screen_height: usize, params: &SpringParams) -> Self {
        let (w, h) = (screen_width as f32, screen_height as f32);
        let span = h * 0.5;
        Self {
            left: (w - span) * 0.5,
            top: h * 0.25,
            step_x: span / params.mesh_width.saturating_sub(1).max(1) as f32,
            step_y: span / params.mesh_height.saturating_sub(1).max(1) as f32,
        }
    }

    /// Rest position of lattice node (x, y).
    pub fn node(&self, x: usize, y: usize) -> [f32; 2] {
        [self.left + self.step_x * x as f32, self.top + self.step_y * y as f32]
    }
}

/// Spring mesh demo state, with a fading particle trail.
pub struct SpringMeshSim {
    particles: DoubleBuffer<MeshParticles>,
    trail: DoubleBuffer<FieldBuffer>,
    params: SpringParams,
    drive: Option<SpringDrive>,
}

impl SpringMeshSim {
    /// Wrap existing lattice particles, rendering into a `width × height` trail.
    pub fn from_particles(
        particles: MeshParticles,
        width: usize,
        height: usize,
        params: SpringParams,
        drive: Option<SpringDrive>,
    ) -> Self {
        Self {
            particles: DoubleBuffer::from_initial(particles),
            trail: DoubleBuffer::from_initial(FieldBuffer::new(width, height)),
            params,
            drive,
        }
    }

    /// Lay the lattice out over the screen with jittered rest positions.
    pub fn seeded<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        params: SpringParams,
        rng: &mut R,
    ) -> Self {
        let layout = MeshLayout::centered(width, height, &params);
        let jitter = params.jitter.abs();

        let mut particles = MeshParticles::new(params.mesh_width * params.mesh_height);
        for y in 0..params.mesh_height {
            for x in 0..params.mesh_width {
                let [nx, ny] = layout.node(x, y);
                let record = particles.record_mut(y * params.mesh_width + x);
                record[field::X] = nx + rng.gen_range(-jitter..=jitter);
                record[field::Y] = ny + rng.gen_range(-jitter..=jitter);
            }
        }

        let drive = params.drive_row.map(|row| SpringDrive {
            row,
            base_y: layout.node(0, row)[1],
            amplitude: params.drive_amplitude * layout.step_y,
            period: params.drive_period,
        });

        tracing::info!(
            mesh_width = params.mesh_width,
            mesh_height = params.mesh_height,
            connectivity = ?params.connectivity,
            driven = drive.is_some(),
            "spring mesh seeded"
        );
        Self::from_particles(particles, width, height, params, drive)
    }

    /// The latest lattice state.
    pub fn particles(&self) -> &MeshParticles {
        self.particles.current()
    }

    /// The drive, if any.
    pub fn drive(&self) -> Option<&SpringDrive> {
        self.drive.as_ref()
    }

    /// Parameters in use.
    pub fn params(&self) -> &SpringParams {
        &self.params
    }
}

impl Simulation for SpringMeshSim {
    fn name(&self) -> &'static str {
        "spring"
    }

    /// Drive the row, then fade the trail and splat the particles.
    ///
    /// The trail is updated on every frame, displayed or not.
    fn prepare(&mut self, frame: u64) {
        if let Some(drive) = self.drive {
            drive.apply(self.particles.current_mut(), self.params.mesh_width, frame);
        }

        let (previous, image) = self.trail.split_mut();
        render::fade_into(previous, image, self.params.fade);
        let positions = self
            .particles
            .current()
            .records()
            .iter()
            .map(|r| (r[field::X], r[field::Y]));
        render::splat(image, positions, 1.0);
        self.trail.advance();
    }

    fn render(&mut self) -> &FieldBuffer {
        self.trail.current()
    }

    fn step<E: KernelEvaluator>(&mut self, evaluator: &E) {
        let (current, next) = self.particles.split_mut();
        evaluator.realize_particles(&SpringMesh::new(current, &self.params), next);
        self.particles.advance();
    }
}
