//! Rigid-body physics world
//!
//! The simulation talks to physics only through [`PhysicsWorld`]. [`BoxWorld`]
//! is backed by rapier3d: the active layer is a kinematic body driven by
//! position, seated layers are fixed, and overhang fragments are dynamic
//! cuboids that fall and tumble.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_SUBSTEPS, PHYSICS_DT, SLEEP_PLANE};
use crate::tuning::Tuning;

/// Opaque handle to a body in a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("no body with handle {0:?}")]
    UnknownBody(BodyHandle),
    #[error("box half extents must be positive, got {0}")]
    DegenerateShape(Vec3),
}

/// How a body moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    /// Never moves (seated layers)
    Fixed,
    /// Moved only through [`PhysicsWorld::set_position`] (the sliding layer)
    Kinematic,
    /// Falls under gravity
    Dynamic { mass: f32 },
}

/// Parameters for a new box body
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec3,
    pub half_extents: Vec3,
    pub kind: BodyKind,
}

/// Operations the simulation needs from a physics engine
///
/// Bodies may only be added or removed between calls to [`step`](Self::step).
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    fn remove_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError>;

    /// Teleport a body (used for the kinematically driven active layer)
    fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> Result<(), PhysicsError>;

    /// Turn a body into a fixed one that nothing can move
    fn fix_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError>;

    fn position(&self, handle: BodyHandle) -> Option<Vec3>;

    fn rotation(&self, handle: BodyHandle) -> Option<Quat>;

    /// Detach the body's collision box and attach a new one
    ///
    /// Shapes are never scaled in place. On error the old shape stays attached.
    fn replace_shape(&mut self, handle: BodyHandle, half_extents: Vec3) -> Result<(), PhysicsError>;

    /// Advance the simulation by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Remove every body
    fn clear(&mut self);

    fn body_count(&self) -> usize;
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn cuboid(half_extents: Vec3, mass: Option<f32>) -> Collider {
    let builder = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z);
    match mass {
        Some(mass) => builder.mass(mass).build(),
        None => builder.build(),
    }
}

/// Box physics world on rapier3d
pub struct BoxWorld {
    gravity: Vector<Real>,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    /// Ordered so iteration is deterministic
    handles: BTreeMap<BodyHandle, RigidBodyHandle>,
    next_handle: u32,
}

impl BoxWorld {
    pub fn new(gravity_y: f32, solver_iterations: u32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            num_solver_iterations: NonZeroUsize::new(solver_iterations as usize)
                .unwrap_or(NonZeroUsize::MIN),
            ..Default::default()
        };

        Self {
            gravity: vector![0.0, gravity_y, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handles: BTreeMap::new(),
            next_handle: 1,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.gravity, tuning.solver_iterations)
    }

    fn rapier_handle(&self, handle: BodyHandle) -> Result<RigidBodyHandle, PhysicsError> {
        self.handles
            .get(&handle)
            .copied()
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let rb = self.handles.get(&handle)?;
        self.rigid_body_set.get(*rb)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        let rb = self.rapier_handle(handle)?;
        self.rigid_body_set
            .get_mut(rb)
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Current velocity of a body
    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| to_vec3(b.linvel()))
    }

    /// Current collision half extents of a body
    pub fn half_extents(&self, handle: BodyHandle) -> Option<Vec3> {
        let body = self.body(handle)?;
        let collider = self.collider_set.get(*body.colliders().first()?)?;
        collider
            .shape()
            .as_cuboid()
            .map(|c| to_vec3(&c.half_extents))
    }

    /// Whether a body is still simulated under gravity
    pub fn is_dynamic(&self, handle: BodyHandle) -> Option<bool> {
        self.body(handle).map(|b| b.is_dynamic())
    }

    fn step_once(&mut self, h: f32) {
        self.integration_parameters.dt = h;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Freeze fragments that fell out of the world
    fn retire_lost_bodies(&mut self) {
        for rb in self.handles.values() {
            if let Some(body) = self.rigid_body_set.get_mut(*rb) {
                if body.is_dynamic() && body.translation().y < SLEEP_PLANE {
                    body.set_linvel(Vector::zeros(), false);
                    body.set_angvel(Vector::zeros(), false);
                    body.set_body_type(RigidBodyType::Fixed, false);
                }
            }
        }
    }
}

impl Default for BoxWorld {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

impl PhysicsWorld for BoxWorld {
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let (builder, mass) = match desc.kind {
            BodyKind::Fixed => (RigidBodyBuilder::fixed(), None),
            BodyKind::Kinematic => (RigidBodyBuilder::kinematic_position_based(), None),
            BodyKind::Dynamic { mass } => {
                (RigidBodyBuilder::dynamic().ccd_enabled(true), Some(mass))
            }
        };
        let body = builder.translation(to_vector(desc.position)).build();
        let rb = self.rigid_body_set.insert(body);
        self.collider_set.insert_with_parent(
            cuboid(desc.half_extents, mass),
            rb,
            &mut self.rigid_body_set,
        );

        self.handles.insert(handle, rb);
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let rb = self
            .handles
            .remove(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.rigid_body_set.remove(
            rb,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        Ok(())
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.set_translation(to_vector(position), true);
        if body.is_kinematic() {
            body.set_next_kinematic_translation(to_vector(position));
        }
        Ok(())
    }

    fn fix_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let body = self.body_mut(handle)?;
        body.set_body_type(RigidBodyType::Fixed, true);
        Ok(())
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| to_vec3(b.translation()))
    }

    fn rotation(&self, handle: BodyHandle) -> Option<Quat> {
        self.body(handle).map(|b| {
            let q = b.rotation();
            Quat::from_xyzw(q.i, q.j, q.k, q.w)
        })
    }

    fn replace_shape(&mut self, handle: BodyHandle, half_extents: Vec3) -> Result<(), PhysicsError> {
        if half_extents.min_element() <= 0.0 {
            return Err(PhysicsError::DegenerateShape(half_extents));
        }
        let rb = self.rapier_handle(handle)?;
        let Some(body) = self.rigid_body_set.get(rb) else {
            return Err(PhysicsError::UnknownBody(handle));
        };
        let old: Vec<ColliderHandle> = body.colliders().to_vec();
        let mass = if body.is_dynamic() {
            old.first()
                .and_then(|c| self.collider_set.get(*c))
                .map(|c| c.mass())
        } else {
            None
        };

        for collider in old {
            self.collider_set.remove(
                collider,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            );
        }
        self.collider_set
            .insert_with_parent(cuboid(half_extents, mass), rb, &mut self.rigid_body_set);
        Ok(())
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let substeps = ((dt / PHYSICS_DT).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let h = (dt / substeps as f32).min(PHYSICS_DT);
        if h * (substeps as f32) < dt {
            log::debug!("Physics dropped {:.3}s of a long frame", dt - h * substeps as f32);
        }
        for _ in 0..substeps {
            self.step_once(h);
        }
        self.retire_lost_bodies();
    }

    fn clear(&mut self) {
        let next_handle = self.next_handle;
        let gravity_y = self.gravity.y;
        let iterations = self.integration_parameters.num_solver_iterations;
        *self = Self::new(gravity_y, iterations.get() as u32);
        self.next_handle = next_handle;
    }

    fn body_count(&self) -> usize {
        self.handles.len()
    }
}
