
pub mod datasets;
pub mod errors;
pub mod normalize;
pub mod records;
pub mod roles;
pub mod transform;

pub use datasets::DatasetFamily;
pub use errors::ValidationError;
pub use normalize::{normalize_name, parse_cost, parse_date, parse_timestamp};
pub use roles::map_role;
pub use transform::{
    transform_addenda_routing, transform_building_contact, transform_electrical_contact,
    transform_inspection, transform_permit, transform_plumbing_contact, transform_violation,
};
