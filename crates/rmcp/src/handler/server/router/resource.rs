//! Resource dispatch table, mirroring [`super::tool::ToolRouter`].

use std::{collections::HashMap, sync::Arc};

use futures::FutureExt;

use crate::{
    handler::server::resource::{DynReadResourceHandler, ReadResourceHandler, ResourceReadContext},
    model::{Resource, ResourceTemplate},
};

pub struct ResourceRoute<S> {
    #[allow(clippy::type_complexity)]
    pub call: Arc<DynReadResourceHandler<S>>,
    pub attr: Resource,
}

impl<S> std::fmt::Debug for ResourceRoute<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRoute").field("uri", &self.attr.uri).finish()
    }
}

impl<S> Clone for ResourceRoute<S> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            attr: self.attr.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> ResourceRoute<S> {
    pub fn new<C>(attr: impl Into<Resource>, call: C) -> Self
    where
        C: ReadResourceHandler<S> + Send + Sync + Clone + 'static,
    {
        Self {
            call: Arc::new(move |context: ResourceReadContext<S>| {
                let call = call.clone();
                context.invoke(call).boxed()
            }),
            attr: attr.into(),
        }
    }
}

pub trait IntoResourceRoute<S> {
    fn into_resource_route(self) -> ResourceRoute<S>;
}

impl<S, C, T> IntoResourceRoute<S> for (T, C)
where
    S: Send + Sync + 'static,
    C: ReadResourceHandler<S> + Send + Sync + Clone + 'static,
    T: Into<Resource>,
{
    fn into_resource_route(self) -> ResourceRoute<S> {
        ResourceRoute::new(self.0.into(), self.1)
    }
}

impl<S> IntoResourceRoute<S> for ResourceRoute<S>
where
    S: Send + Sync + 'static,
{
    fn into_resource_route(self) -> ResourceRoute<S> {
        self
    }
}

#[derive(Debug)]
pub struct ResourceRouter<S> {
    pub map: HashMap<String, ResourceRoute<S>>,
    pub templates: Vec<ResourceTemplate>,
}

impl<S> Default for ResourceRouter<S> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            templates: Vec::new(),
        }
    }
}

impl<S> Clone for ResourceRouter<S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            templates: self.templates.clone(),
        }
    }
}

impl<S> IntoIterator for ResourceRouter<S> {
    type Item = ResourceRoute<S>;
    type IntoIter = std::collections::hash_map::IntoValues<String, ResourceRoute<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_values()
    }
}

impl<S> ResourceRouter<S>
where
    S: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route<C>(mut self, attr: Resource, call: C) -> Self
    where
        C: ReadResourceHandler<S> + Send + Sync + Clone + 'static,
    {
        self.add_route(ResourceRoute::new(attr, call));
        self
    }

    pub fn add_route(&mut self, item: ResourceRoute<S>) {
        self.map.insert(item.attr.uri.clone(), item);
    }

    pub fn add_template(&mut self, template: ResourceTemplate) {
        self.templates.push(template);
    }

    pub fn merge(&mut self, other: ResourceRouter<S>) {
        for item in other.map.into_values() {
            self.add_route(item);
        }
        self.templates.extend(other.templates);
    }

    pub fn has_route(&self, uri: &str) -> bool {
        self.map.contains_key(uri)
    }

    pub async fn read(
        &self,
        context: ResourceReadContext<'_, S>,
    ) -> Result<crate::model::ReadResourceResult, crate::Error> {
        let item = self
            .map
            .get(context.uri.as_str())
            .ok_or_else(|| crate::Error::resource_not_found("resource not found", None))?;
        (item.call)(context).await
    }

    pub fn list_all(&self) -> Vec<Resource> {
        self.map.values().map(|item| item.attr.clone()).collect()
    }

    pub fn list_all_templates(&self) -> Vec<ResourceTemplate> {
        self.templates.clone()
    }
}

impl<S> std::ops::Add<ResourceRouter<S>> for ResourceRouter<S>
where
    S: Send + Sync + 'static,
{
    type Output = Self;

    fn add(mut self, other: ResourceRouter<S>) -> Self::Output {
        self.merge(other);
        self
    }
}

impl<S> std::ops::AddAssign<ResourceRouter<S>> for ResourceRouter<S>
where
    S: Send + Sync + 'static,
{
    fn add_assign(&mut self, other: ResourceRouter<S>) {
        self.merge(other);
    }
}
