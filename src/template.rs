use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::field::Locals;

/// Opaque handle to a rendering routine owned by the host.
#[derive(Clone)]
pub struct Template {
    name: String,
    render: Rc<dyn Fn(&Locals) -> String>,
}

impl Template {
    pub fn new(name: impl Into<String>, render: impl Fn(&Locals) -> String + 'static) -> Self {
        Self { name: name.into(), render: Rc::new(render) }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn render(&self, locals: &Locals) -> String { (self.render)(locals) }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

/// Templates keyed by component name (`Textbox`, `Struct`, ...).
#[derive(Debug, Clone, Default)]
pub struct Templates(IndexMap<String, Template>);

impl Templates {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, component: impl Into<String>, template: Template) -> Self {
        self.0.insert(component.into(), template);
        self
    }

    pub fn get(&self, component: &str) -> Option<&Template> { self.0.get(component) }
}
