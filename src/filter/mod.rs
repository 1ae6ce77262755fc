//! Filter chain subsystem.
//!
//! # Data Flow
//! ```text
//! Request enters chain head
//!     → filter.rs (for each filter, outermost first)
//!         → matcher.rs (method set AND id pattern)
//!         → condition script (skip hooks unless it yields true)
//!         → onRequest (may replace the request)
//!         → next link
//!         → onResponse / onFailure (observe the outcome)
//!     → chain.rs terminal link: route table
//!
//! Chain Compilation (activation and every config change):
//!     FilterConfig[]
//!     → Compile matchers and resolve scripts
//!     → Freeze as immutable FilterChain
//!     → Swap into the router service
//! ```
//!
//! # Design Decisions
//! - Chains are immutable; reconfiguration builds a new one
//! - A request finishes on the chain it started with
//! - Hooks nest: outer onRequest before inner, outer onFailure after inner
//! - Failure hooks observe failures but never swallow or replace them

pub mod chain;
pub mod filter;
pub mod matcher;

pub use chain::FilterChain;
pub use filter::{Filter, Hook};
pub use matcher::{AndMatcher, IdPatternMatcher, Matcher, MethodMatcher};
