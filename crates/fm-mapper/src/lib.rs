//! Resolution and runtime dispatch for declared object-to-object mappings.
//!
//! A [`MapperDeclaration`] is resolved against a [`fm_core::TypeCatalog`] into a
//! [`MapperOutcome`]: a registry of mapping descriptors, one body per mapping
//! and, for polymorphic entry points, an ordered [`Dispatch`] table. The
//! outcome can then be executed with a [`MappingRuntime`].

pub mod declaration;
pub mod descriptor;
pub mod dispatch;
pub mod enums;
pub mod path;
pub mod properties;
pub mod registry;
pub mod resolve;
pub mod runtime;
pub mod specificity;

pub use declaration::{
    DerivedTypeSpec, EnumMappingStrategy, MapperDeclaration, MapperFile, MapperOptions,
    MappingDeclaration, MappingKind, PropertyRename, UnmappedEnumPolicy,
};
pub use descriptor::{DerivedTypeAssociation, MappingDescriptor, MappingHandle, MappingOrigin};
pub use dispatch::{Dispatch, DispatchArm};
pub use enums::EnumMappingPlan;
pub use path::PropertyPath;
pub use properties::{MemberConversion, PropertyAssignment, PropertyMappingPlan};
pub use registry::MappingRegistry;
pub use resolve::{
    resolve_mapping, DeclarationError, Mapper, MapperOutcome, MappingBody, ResolvedMapping,
};
pub use runtime::{EntryPoint, MappingHandler, MappingRuntime};
pub use specificity::{order_by_specificity, DispatchCandidate};
