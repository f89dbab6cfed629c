//! The ordered shape list.
//!
//! Order is z-order: index 0 is bottom-most, the last index is top-most.
//! Only `bring_to_front`/`send_to_back` ever move a shape.

use crate::error::ModelError;
use crate::id::ShapeId;
use crate::model::{Shape, ShapePatch};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    pub fn as_slice(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn position(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// Append a shape on top of the stack.
    pub fn add(&mut self, shape: Shape) -> Result<(), ModelError> {
        if self.contains(shape.id) {
            return Err(ModelError::DuplicateId(shape.id));
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Merge a patch into the shape with `id`, in place.
    pub fn update(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<(), ModelError> {
        let shape = self.get_mut(id).ok_or(ModelError::NotFound(id))?;
        patch.apply(shape);
        Ok(())
    }

    pub fn remove(&mut self, id: ShapeId) -> Result<Shape, ModelError> {
        let pos = self.position(id).ok_or(ModelError::NotFound(id))?;
        Ok(self.shapes.remove(pos))
    }

    /// Move a shape to the top of z-order. Returns true if the order changed.
    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if pos + 1 == self.shapes.len() {
            return false;
        }
        let shape = self.shapes.remove(pos);
        self.shapes.push(shape);
        true
    }

    /// Move a shape to the bottom of z-order. Returns true if the order changed.
    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if pos == 0 {
            return false;
        }
        let shape = self.shapes.remove(pos);
        self.shapes.insert(0, shape);
        true
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Replace the whole list, e.g. when restoring a history snapshot.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
    }

    pub fn to_vec(&self) -> Vec<Shape> {
        self.shapes.clone()
    }
}

impl<'a> IntoIterator for &'a ShapeList {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}
