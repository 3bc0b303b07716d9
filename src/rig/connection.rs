use super::{Consumer, Input, Output, Producer};
use crate::error::{RigError, RigResult};
use crate::script::{self, MAX_ARITY};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Declarative connection: named producer bindings, one consumer binding and
/// an optional expression body over the producer names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSpec {
    /// `(parameter name, "alias.key")` in declaration order
    pub producers: Vec<(String, String)>,
    pub output: Option<String>,
    pub function: Option<String>,
}

impl ConnectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(mut self, name: impl Into<String>, binding: impl Into<String>) -> Self {
        self.producers.push((name.into(), binding.into()));
        self
    }

    pub fn output(mut self, binding: impl Into<String>) -> Self {
        self.output = Some(binding.into());
        self
    }

    pub fn function(mut self, body: impl Into<String>) -> Self {
        self.function = Some(body.into());
        self
    }

    /// `(p0,p1){body}` built from the parameter names and the body
    fn definition(&self, body: &str) -> String {
        let names: Vec<&str> = self.producers.iter().map(|(name, _)| name.as_str()).collect();
        format!("({}){{{}}}", names.join(","), body)
    }
}

impl fmt::Display for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<&str> = self.producers.iter().map(|(_, b)| b.as_str()).collect();
        write!(f, "[{}]", sources.join(", "))?;
        if let Some(body) = &self.function {
            write!(f, " -> {{{}}}", body)?;
        }
        write!(f, " -> {}", self.output.as_deref().unwrap_or("?"))
    }
}

/// Splits `alias.key`; the key itself may contain further dots
fn split_binding(binding: &str) -> RigResult<(&str, &str)> {
    binding
        .split_once('.')
        .map(|(alias, key)| (alias.trim(), key.trim()))
        .ok_or_else(|| {
            RigError::config(format!(
                "binding \"{}\" must have the form alias.key",
                binding
            ))
        })
}

/// One wired path from producers through an optional expression into a consumer
pub struct Connection {
    label: String,
    action: Box<dyn Fn()>,
}

impl Connection {
    pub fn build(
        spec: &ConnectionSpec,
        inputs: &BTreeMap<String, Box<dyn Input>>,
        outputs: &BTreeMap<String, Box<dyn Output>>,
    ) -> RigResult<Self> {
        if spec.producers.is_empty() {
            return Err(RigError::config("a connection needs at least one input"));
        }
        if spec.producers.len() > MAX_ARITY {
            return Err(RigError::config(format!(
                "a connection takes at most {} inputs, got {}",
                MAX_ARITY,
                spec.producers.len()
            )));
        }
        let output = spec
            .output
            .as_deref()
            .ok_or_else(|| RigError::config("a connection needs exactly one output"))?;
        let function = spec.function.as_deref().filter(|f| !f.trim().is_empty());
        if spec.producers.len() > 1 && function.is_none() {
            return Err(RigError::config(
                "a connection with several inputs needs a function",
            ));
        }

        let mut producers: Vec<Producer> = Vec::with_capacity(spec.producers.len());
        for (_, binding) in &spec.producers {
            let (alias, key) = split_binding(binding)?;
            let input = inputs
                .get(alias)
                .ok_or_else(|| RigError::config(format!("unknown input \"{}\"", alias)))?;
            producers.push(input.producer(key)?);
        }

        let (alias, key) = split_binding(output)?;
        let consumer: Consumer = outputs
            .get(alias)
            .ok_or_else(|| RigError::config(format!("unknown output \"{}\"", alias)))?
            .consumer(key)?;

        let action = match function {
            None => {
                let producer = producers.remove(0);
                Box::new(move || consumer(producer())) as Box<dyn Fn()>
            }
            Some(body) => compose(spec.definition(body), producers, consumer)?,
        };

        let label = spec.to_string();
        debug!("Wired connection {}", label);
        Ok(Self { label, action })
    }

    pub fn run(&self) {
        (self.action)()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("label", &self.label).finish()
    }
}

fn compose(
    definition: String,
    producers: Vec<Producer>,
    consumer: Consumer,
) -> RigResult<Box<dyn Fn()>> {
    let mut producers = producers.into_iter();
    let action: Box<dyn Fn()> = match (producers.next(), producers.next(), producers.next()) {
        (Some(x), None, None) => {
            let func = script::compile::<1>(&definition)?;
            Box::new(move || consumer(func.call([x()])))
        }
        (Some(x), Some(y), None) => {
            let func = script::compile::<2>(&definition)?;
            Box::new(move || consumer(func.call([x(), y()])))
        }
        (Some(x), Some(y), Some(z)) => {
            let func = script::compile::<3>(&definition)?;
            Box::new(move || consumer(func.call([x(), y(), z()])))
        }
        _ => return Err(RigError::config("a connection needs at least one input")),
    };
    Ok(action)
}
