pub mod bounds;
pub mod frustum;
pub mod instance;
pub mod interpreter;
pub mod model;

pub use bounds::BoundingBox;
pub use frustum::{Frustum, FrustumClassifier, IntersectionState};
pub use instance::{AnimatorBinding, InstanceState, ModelInstance};
#[cfg(feature = "parallel")]
pub use interpreter::evaluate_instances_parallel;
pub use interpreter::{NodeOverrides, evaluate_instance, evaluate_instance_with_settings};
pub use model::{BlendSource, ModelDefinition, ModelNode, NodeTreeOp, ROOT_SLOT};
