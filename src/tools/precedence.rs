//! Framework precedence: which package frameworks a project framework accepts,
//! most preferred first

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::tools::adapters::Framework;
use crate::tools::error::{Operation, PrecedenceError};
use crate::tools::frameworks::FrameworkList;
use crate::tools::loader::IsolationContext;
use crate::tools::release::Release;

/// A project framework and the package frameworks it accepts, in the release's
/// order of preference
#[derive(Debug)]
pub struct PrecedenceList {
    pub project: Framework,
    pub frameworks: Vec<Framework>,
}

pub struct FrameworkPrecedenceService {
    context: Arc<IsolationContext>,
    framework_list: Arc<dyn FrameworkList>,
}

impl FrameworkPrecedenceService {
    pub fn new(context: Arc<IsolationContext>, framework_list: Arc<dyn FrameworkList>) -> Self {
        Self {
            context,
            framework_list,
        }
    }

    pub fn release(&self) -> &Release {
        self.context.release()
    }

    pub fn version(&self) -> &str {
        self.context.release().as_str()
    }

    /// Known frameworks compatible with `input`, ordered by repeatedly taking
    /// the release's nearest match among the remaining ones.
    pub fn precedence(&self, input: &str) -> Result<PrecedenceList, PrecedenceError> {
        let api = self.context.framework();
        let project = Framework::parse(api, input)?;

        if !api.supports(Operation::FrameworkPrecedence) {
            return Err(api.not_supported(Operation::FrameworkPrecedence).into());
        }

        let known = self.framework_list.frameworks();
        let mut seen = HashSet::new();
        let mut remaining: Vec<Framework> = known
            .iter()
            .filter_map(|name| Framework::parse(api, name).ok())
            .filter(|candidate| project.is_compatible(candidate))
            .filter(|candidate| seen.insert(candidate.dotnet_framework_name()))
            .collect();
        debug!(
            "{} of {} known frameworks are compatible with {}",
            remaining.len(),
            known.len(),
            input
        );

        let mut frameworks = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let index = {
                let candidates: Vec<&Framework> = remaining.iter().collect();
                project
                    .nearest(&candidates)?
                    .and_then(|nearest| candidates.iter().position(|c| std::ptr::eq(*c, nearest)))
            };

            let Some(index) = index else {
                break;
            };
            frameworks.push(remaining.remove(index));
        }

        Ok(PrecedenceList {
            project,
            frameworks,
        })
    }
}
