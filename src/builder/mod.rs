//! Building Go programs.
//!
//! Nothing here compiles code directly: the Go toolchain does that. This
//! module decides *when* to build and where the results live.

pub mod build_cache;
pub mod fingerprint;
pub mod no_cache;
pub mod toolchain;

pub use build_cache::{sweep, BuildCache, BuildCacheOptions, SweepStats};
pub use fingerprint::{classify_target, BuildInfo, BuildTarget, SourceFile};
pub use no_cache::{build_uncached, UncachedBuild};
pub use toolchain::{detect_go, EnvInfo, GoToolchain, InstallRequest, Toolchain};
