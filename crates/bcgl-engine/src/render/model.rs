//! Mesh plus material, optionally split into named parts.

use super::backend::RenderBackend;
use super::ctx::RenderContext;
use super::mesh::{Mesh, MeshPart};
use super::state::Material;

#[derive(Debug)]
pub struct Model {
    pub mesh: Mesh,
    pub material: Material,
    pub parts: Vec<MeshPart>,
}

impl Model {
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            mesh,
            material,
            parts: Vec::new(),
        }
    }

    pub fn with_parts(mut self, parts: Vec<MeshPart>) -> Self {
        self.parts = parts;
        self
    }

    /// Builds a model from same-format meshes, one named part per source.
    pub fn merged(sources: &[(&str, &Mesh)], material: Material) -> Option<Self> {
        let (mesh, parts) = Mesh::merge(sources)?;
        Some(Self::new(mesh, material).with_parts(parts))
    }

    pub fn part_by_name(&self, name: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.name.as_deref() == Some(name))
    }
}

impl<B: RenderBackend> RenderContext<B> {
    /// Draws the whole model with its material, then restores the default
    /// material.
    pub fn draw_model(&mut self, model: &Model) {
        self.set_material(&model.material);
        self.draw_mesh(&model.mesh);
        self.reset_material();
    }

    /// Draws one part; out-of-range indices draw nothing.
    pub fn draw_model_part(&mut self, model: &Model, index: usize) {
        let Some(part) = model.parts.get(index) else {
            log::warn!("model has no part {index} ({} parts)", model.parts.len());
            return;
        };
        self.set_material(&model.material);
        self.draw_mesh_part(&model.mesh, part);
        self.reset_material();
    }
}
