//! Field names of the module-root schema.
//!
//! A module is a `Module` entity. Its content roots are `ContentRoot`
//! children; source and exclude roots hang off the content roots. Order
//! entries and extensions (`Facet` kinds) are children of the module.

/// Module name.
pub const NAME: &str = "name";
/// Root URL on content, source, and exclude roots.
pub const URL: &str = "url";
/// Source root type, e.g. `"java-source"`.
pub const ROOT_TYPE: &str = "root_type";
/// True on test source roots.
pub const IS_TEST: &str = "test";
/// Module sdk name.
pub const SDK: &str = "sdk";
/// True if the module uses the project sdk.
pub const INHERIT_SDK: &str = "inherit_sdk";
/// Order entry kind: `"module"`, `"library"`, `"sdk"`, or `"source"`.
pub const ENTRY: &str = "entry";
/// Dependency target on module and library entries.
pub const TARGET: &str = "target";
/// Dependency scope: `"compile"`, `"test"`, `"runtime"`, or `"provided"`.
pub const SCOPE: &str = "scope";
/// True if the dependency is exported.
pub const EXPORTED: &str = "exported";
/// Glob patterns excluded under a content root, as a list of strings.
pub const EXCLUDE_PATTERNS: &str = "exclude_patterns";

/// Default source root type.
pub const JAVA_SOURCE: &str = "java-source";
/// Resource root type.
pub const JAVA_RESOURCE: &str = "java-resource";
