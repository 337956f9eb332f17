//! Prompt dispatch table, mirroring [`super::tool::ToolRouter`].

use std::{borrow::Cow, collections::HashMap, sync::Arc};

use futures::FutureExt;

use crate::{
    handler::server::prompt::{DynGetPromptHandler, GetPromptHandler, PromptContext},
    model::{GetPromptResult, Prompt},
};

pub struct PromptRoute<S> {
    #[allow(clippy::type_complexity)]
    pub call: Arc<DynGetPromptHandler<S>>,
    pub attr: Prompt,
}

impl<S> std::fmt::Debug for PromptRoute<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRoute").field("name", &self.attr.name).finish()
    }
}

impl<S> Clone for PromptRoute<S> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            attr: self.attr.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> PromptRoute<S> {
    pub fn new<C, A>(attr: impl Into<Prompt>, call: C) -> Self
    where
        C: GetPromptHandler<S, A> + Send + Sync + Clone + 'static,
        A: 'static,
    {
        Self {
            call: Arc::new(move |context: PromptContext<S>| {
                let call = call.clone();
                context.invoke(call).boxed()
            }),
            attr: attr.into(),
        }
    }
}

pub trait IntoPromptRoute<S, A> {
    fn into_prompt_route(self) -> PromptRoute<S>;
}

impl<S, C, A, T> IntoPromptRoute<S, A> for (T, C)
where
    S: Send + Sync + 'static,
    C: GetPromptHandler<S, A> + Send + Sync + Clone + 'static,
    A: 'static,
    T: Into<Prompt>,
{
    fn into_prompt_route(self) -> PromptRoute<S> {
        PromptRoute::new(self.0.into(), self.1)
    }
}

impl<S> IntoPromptRoute<S, ()> for PromptRoute<S>
where
    S: Send + Sync + 'static,
{
    fn into_prompt_route(self) -> PromptRoute<S> {
        self
    }
}

#[derive(Debug)]
pub struct PromptRouter<S> {
    pub map: HashMap<Cow<'static, str>, PromptRoute<S>>,
}

impl<S> Default for PromptRouter<S> {
    fn default() -> Self {
        Self { map: HashMap::new() }
    }
}

impl<S> Clone for PromptRouter<S> {
    fn clone(&self) -> Self {
        Self { map: self.map.clone() }
    }
}

impl<S> IntoIterator for PromptRouter<S> {
    type Item = PromptRoute<S>;
    type IntoIter = std::collections::hash_map::IntoValues<Cow<'static, str>, PromptRoute<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_values()
    }
}

impl<S> PromptRouter<S>
where
    S: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route<C, A>(mut self, attr: Prompt, call: C) -> Self
    where
        C: GetPromptHandler<S, A> + Send + Sync + Clone + 'static,
        A: 'static,
    {
        self.add_route(PromptRoute::new(attr, call));
        self
    }

    pub fn add_route(&mut self, item: PromptRoute<S>) {
        self.map.insert(item.attr.name.clone().into(), item);
    }

    pub fn merge(&mut self, other: PromptRouter<S>) {
        for item in other.map.into_values() {
            self.add_route(item);
        }
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub async fn get(
        &self,
        context: PromptContext<'_, S>,
    ) -> Result<GetPromptResult, crate::Error> {
        let item = self
            .map
            .get(context.name.as_str())
            .ok_or_else(|| crate::Error::invalid_params("prompt not found", None))?;
        (item.call)(context).await
    }

    pub fn list_all(&self) -> Vec<Prompt> {
        self.map.values().map(|item| item.attr.clone()).collect()
    }
}

impl<S> std::ops::Add<PromptRouter<S>> for PromptRouter<S>
where
    S: Send + Sync + 'static,
{
    type Output = Self;

    fn add(mut self, other: PromptRouter<S>) -> Self::Output {
        self.merge(other);
        self
    }
}

impl<S> std::ops::AddAssign<PromptRouter<S>> for PromptRouter<S>
where
    S: Send + Sync + 'static,
{
    fn add_assign(&mut self, other: PromptRouter<S>) {
        self.merge(other);
    }
}
