//! A single configured filter.
//!
//! # Responsibilities
//! - Decide applicability from method, id pattern and condition script
//! - Run the onRequest / onResponse / onFailure hooks around the next link
//! - Convert script failures into resource errors
//!
//! # Design Decisions
//! - No scope is built for requests that do not match
//! - A condition must yield exactly `true`; a failing condition is an internal error
//! - A request replaced in scope by onRequest is what flows downstream

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::loader::ConfigError;
use crate::config::schema::{FilterConfig, ScriptConfig};
use crate::filter::matcher::{AndMatcher, IdPatternMatcher, Matcher, MethodMatcher};
use crate::resource::{Method, Request, ResourceError, Response};
use crate::script::{Scope, ScopeFactory, Script, ScriptError, ScriptFactory};

/// Hook points of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    OnRequest,
    OnResponse,
    OnFailure,
}

impl Hook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::OnRequest => "onRequest",
            Hook::OnResponse => "onResponse",
            Hook::OnFailure => "onFailure",
        }
    }
}

/// A conditionally applied interception stage.
pub struct Filter {
    pointer: String,
    matcher: AndMatcher,
    condition: Option<Arc<dyn Script>>,
    on_request: Option<Arc<dyn Script>>,
    on_response: Option<Arc<dyn Script>>,
    on_failure: Option<Arc<dyn Script>>,
}

impl Filter {
    /// A filter matching every request with no scripts. `pointer` names it in logs.
    pub fn new(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            matcher: AndMatcher::default(),
            condition: None,
            on_request: None,
            on_response: None,
            on_failure: None,
        }
    }

    /// Build a filter from its configuration, resolving scripts through `scripts`.
    pub fn from_config(
        pointer: &str,
        config: &FilterConfig,
        scripts: &dyn ScriptFactory,
    ) -> Result<Self, ConfigError> {
        let mut filter = Filter::new(pointer);

        if let Some(pattern) = &config.pattern {
            filter = filter.with_pattern(pattern).map_err(|e| ConfigError::Filter {
                pointer: format!("{}/pattern", pointer),
                reason: e.to_string(),
            })?;
        }

        if let Some(names) = &config.methods {
            let methods = names
                .iter()
                .map(|name| name.parse::<Method>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::Filter {
                    pointer: format!("{}/methods", pointer),
                    reason: e.message().to_string(),
                })?;
            filter = filter.with_methods(methods);
        }

        filter.condition = resolve_script(pointer, "condition", config.condition.as_ref(), scripts)?;
        filter.on_request = resolve_script(pointer, "onRequest", config.on_request.as_ref(), scripts)?;
        filter.on_response = resolve_script(pointer, "onResponse", config.on_response.as_ref(), scripts)?;
        filter.on_failure = resolve_script(pointer, "onFailure", config.on_failure.as_ref(), scripts)?;

        Ok(filter)
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.matcher.push(Box::new(MethodMatcher::new(methods)));
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.matcher.push(Box::new(IdPatternMatcher::new(pattern)?));
        Ok(self)
    }

    pub fn with_condition(mut self, script: Arc<dyn Script>) -> Self {
        self.condition = Some(script);
        self
    }

    pub fn with_hook(mut self, hook: Hook, script: Arc<dyn Script>) -> Self {
        match hook {
            Hook::OnRequest => self.on_request = Some(script),
            Hook::OnResponse => self.on_response = Some(script),
            Hook::OnFailure => self.on_failure = Some(script),
        }
        self
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Method and id applicability, without the condition.
    pub fn matches(&self, method: Method, id: Option<&str>) -> bool {
        self.matcher.matches(method, id)
    }

    /// Evaluate the condition script. Absent condition means the filter applies.
    pub fn evaluate_condition(&self, scope: &mut Scope) -> Result<bool, ResourceError> {
        let result = match &self.condition {
            Some(condition) => match condition.execute(scope) {
                Ok(value) => value == Value::Bool(true),
                Err(e) => {
                    let msg = format!("{} condition script encountered exception", self.pointer);
                    tracing::debug!(pointer = %self.pointer, error = %e, "{}", msg);
                    return Err(ResourceError::internal_with(msg));
                }
            },
            None => true,
        };
        tracing::debug!(pointer = %self.pointer, result, "evalCondition yielded");
        Ok(result)
    }

    /// Run one hook. Absent hooks are a no-op.
    pub fn run_hook(&self, hook: Hook, scope: &mut Scope) -> Result<(), ResourceError> {
        let script = match hook {
            Hook::OnRequest => &self.on_request,
            Hook::OnResponse => &self.on_response,
            Hook::OnFailure => &self.on_failure,
        };
        let Some(script) = script else {
            return Ok(());
        };

        tracing::debug!(pointer = %self.pointer, hook = hook.as_str(), "Calling filter script");
        match script.execute(scope) {
            Ok(_) => Ok(()),
            Err(ScriptError::Thrown(e)) => {
                tracing::debug!(pointer = %self.pointer, hook = hook.as_str(), error = %e, "Script threw resource error");
                Err(e)
            }
            Err(e) => {
                let msg = format!("{} {} script encountered exception", self.pointer, hook.as_str());
                tracing::debug!(pointer = %self.pointer, error = %e, "{}", msg);
                Err(ResourceError::internal_with(msg))
            }
        }
    }

    /// Filter one request around `next`.
    pub fn filter<F>(
        &self,
        mut request: Request,
        scopes: &dyn ScopeFactory,
        next: F,
    ) -> Result<Response, ResourceError>
    where
        F: FnOnce(Request) -> Result<Response, ResourceError>,
    {
        let method = request.method()?;
        if !self.matches(method, request.id()) {
            return next(request);
        }

        let mut scope = scopes.new_instance(&request);
        scope.put("request", request.to_value());
        if !self.evaluate_condition(&mut scope)? {
            return next(request);
        }

        self.run_hook(Hook::OnRequest, &mut scope)?;
        if let Some(replaced) = replaced_request(&scope, &request) {
            tracing::debug!(pointer = %self.pointer, "onRequest replaced the request");
            request = Request::from_value(replaced)?;
        }

        match next(request) {
            Ok(response) => {
                scope.put("response", response.clone());
                self.run_hook(Hook::OnResponse, &mut scope)?;
                Ok(response)
            }
            Err(err) => {
                scope.put("exception", err.to_json());
                if let Err(hook_err) = self.run_hook(Hook::OnFailure, &mut scope) {
                    tracing::warn!(
                        pointer = %self.pointer,
                        error = %hook_err,
                        original = %err,
                        "onFailure script failed, reporting original failure"
                    );
                }
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("pointer", &self.pointer)
            .field("matcher", &self.matcher)
            .field("condition", &self.condition.is_some())
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// The scope's `request` entry, if a script changed it.
fn replaced_request(scope: &Scope, seeded: &Request) -> Option<Value> {
    match scope.get("request") {
        Some(Value::Object(map)) if map == seeded.as_map() => None,
        Some(Value::Null) | None => None,
        Some(other) => Some(other.clone()),
    }
}

fn resolve_script(
    pointer: &str,
    hook: &str,
    config: Option<&ScriptConfig>,
    scripts: &dyn ScriptFactory,
) -> Result<Option<Arc<dyn Script>>, ConfigError> {
    let Some(config) = config else {
        return Ok(None);
    };
    let script_pointer = format!("{}/{}", pointer, hook);
    scripts
        .new_instance(&script_pointer, config)
        .map(Some)
        .map_err(|e| ConfigError::Filter {
            pointer: script_pointer,
            reason: e.to_string(),
        })
}
