//! Node and directive transforms, one module per concern.

pub mod hoist_static;
pub mod transform_element;
pub mod transform_slot;
pub mod transform_text;
pub mod v_bind;
pub mod v_for;
pub mod v_if;
pub mod v_model;
pub mod v_on;
