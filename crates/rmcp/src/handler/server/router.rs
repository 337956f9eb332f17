//! Request routers: map an incoming name (tool, prompt, resource) to a handler.

pub mod prompt;
pub mod resource;
pub mod tool;

pub use prompt::{PromptRoute, PromptRouter};
pub use resource::{ResourceRoute, ResourceRouter};
pub use tool::{ToolRoute, ToolRouter};

/// Bundles the three dispatch tables a [`crate::ServerHandler`] delegates to
/// by default, so a handler only has to assemble one value in `new()`
/// instead of wiring three fields by hand.
#[derive(Debug, Default, Clone)]
pub struct Router<S> {
    pub tool_router: ToolRouter<S>,
    pub prompt_router: PromptRouter<S>,
    pub resource_router: ResourceRouter<S>,
}

impl<S> Router<S>
where
    S: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            tool_router: ToolRouter::default(),
            prompt_router: PromptRouter::new(),
            resource_router: ResourceRouter::new(),
        }
    }

    pub fn with_tool_router(mut self, router: ToolRouter<S>) -> Self {
        self.tool_router = router;
        self
    }

    pub fn with_prompt_router(mut self, router: PromptRouter<S>) -> Self {
        self.prompt_router = router;
        self
    }

    pub fn with_resource_router(mut self, router: ResourceRouter<S>) -> Self {
        self.resource_router = router;
        self
    }
}

impl<S> std::ops::Add<Router<S>> for Router<S>
where
    S: Send + Sync + 'static,
{
    type Output = Self;

    fn add(mut self, other: Router<S>) -> Self::Output {
        self.tool_router = self.tool_router + other.tool_router;
        self.prompt_router = self.prompt_router + other.prompt_router;
        self.resource_router = self.resource_router + other.resource_router;
        self
    }
}
