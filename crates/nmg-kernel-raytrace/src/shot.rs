//! Shooting rays at a frozen model.

use nmg_kernel_topo::{ManifoldTable, Model};
use rayon::prelude::*;
use tracing::instrument;

use crate::error::Result;
use crate::hitmiss::Hit;
use crate::intersect::RayContext;
use crate::ray::Ray;
use crate::segs::{Segment, SegmentBuilder};
use crate::settings::ShotSettings;

/// Shoots rays at one model.
///
/// The model is borrowed for the shooter's lifetime and never changed, so
/// one shooter can be shared by any number of threads. Each shot gets its
/// own [`RayContext`].
#[derive(Debug)]
pub struct Shooter<'a> {
    model: &'a Model,
    manifolds: ManifoldTable,
    settings: ShotSettings,
}

impl<'a> Shooter<'a> {
    /// Validate the settings and compute the model's manifold table.
    pub fn new(model: &'a Model, settings: ShotSettings) -> Result<Self> {
        settings.validate()?;
        let manifolds = model.manifolds()?;
        Ok(Self {
            model,
            manifolds,
            settings,
        })
    }

    /// The manifold table the shooter classifies with.
    pub fn manifolds(&self) -> &ManifoldTable {
        &self.manifolds
    }

    fn context(&self, ray: &Ray) -> RayContext<'_> {
        RayContext::new(
            self.model,
            &self.manifolds,
            *ray,
            self.settings.tolerance(),
            self.settings.first_touch,
        )
    }

    /// The raw hits along a ray, nearest first.
    pub fn hits(&self, ray: &Ray) -> Result<Vec<Hit>> {
        let mut ctx = self.context(ray);
        ctx.intersect_model()?;
        Ok(ctx.hits.into_hits())
    }

    /// Shoot one ray and return its segments, nearest first.
    #[instrument(skip(self), fields(origin = ?ray.origin, direction = ?ray.direction))]
    pub fn shoot(&self, ray: &Ray) -> Result<Vec<Segment>> {
        let hits = self.hits(ray)?;
        SegmentBuilder::new(self.model, &self.manifolds, *ray, self.settings.tolerance()).build(&hits)
    }

    /// Shoot a batch of rays, on the rayon pool when the settings allow.
    pub fn shoot_all(&self, rays: &[Ray]) -> Vec<Result<Vec<Segment>>> {
        if self.settings.parallel {
            rays.par_iter().map(|ray| self.shoot(ray)).collect()
        } else {
            rays.iter().map(|ray| self.shoot(ray)).collect()
        }
    }
}
