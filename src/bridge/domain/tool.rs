//! Tool definitions registered with the tool server.
//!
//! A registered tool is plain data: its [`ToolTarget`] says where a call is
//! routed, so a single dispatcher can serve every tool through a table keyed
//! by [`ToolName`].

use super::{ActionDescriptor, ActionTarget, AgentId, BridgeDomainError, DiscoveryFilter, ToolName};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const ACTION_DESCRIPTION_TEMPLATE: &str = "\
This tool executes action `{{ action }}` on agent {{ agent_id }}.
Documentation: {% if doc %}{{ doc }}{% else %}(none){% endif %}
Type Signature: {% if type_signature %}{{ type_signature }}{% else %}(unknown){% endif %}
Note: Arguments must be passed as `args`, a list of positional arguments, \
and `kwargs`, a mapping of keyword arguments.";

/// Built-in tools that operate the bridge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlTool {
    /// Registers the tools of one agent immediately.
    AddAgent,
    /// Lists agents matching a class filter.
    DiscoverAgents,
}

impl ControlTool {
    /// All control tools, in registration order.
    pub const ALL: [Self; 2] = [Self::AddAgent, Self::DiscoverAgents];

    /// Returns the registered tool name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddAgent => "add_agent",
            Self::DiscoverAgents => "discover_agents",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::AddAgent => {
                "Add an agent to this server by id. Returns the newly available tools \
                 and their descriptions."
            }
            Self::DiscoverAgents => {
                "List the ids of agents whose class matches `class_name`, optionally \
                 restricted to `module`. Subclasses match unless `allow_subclasses` is false."
            }
        }
    }

    fn input_schema(self) -> Value {
        match self {
            Self::AddAgent => json!({
                "type": "object",
                "properties": {
                    "agent_uid": {"type": "string", "format": "uuid"}
                },
                "required": ["agent_uid"],
                "additionalProperties": false
            }),
            Self::DiscoverAgents => json!({
                "type": "object",
                "properties": {
                    "class_name": {"type": "string"},
                    "module": {"type": "string"},
                    "allow_subclasses": {"type": "boolean", "default": true}
                },
                "required": ["class_name"],
                "additionalProperties": false
            }),
        }
    }
}

/// Where calls to a registered tool are routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum ToolTarget {
    /// Forwards to a remote agent action.
    AgentAction(ActionTarget),
    /// Handled by the bridge.
    Control(ControlTool),
}

/// Invocable tool registered with the tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: ToolName,
    title: String,
    description: String,
    input_schema: Value,
    target: ToolTarget,
}

impl ToolDefinition {
    /// Builds the proxy tool for one action of `agent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::DescriptionRender`] when the description
    /// template fails to render.
    pub fn for_action(
        agent_id: AgentId,
        action: &ActionDescriptor,
    ) -> Result<Self, BridgeDomainError> {
        let name = ToolName::for_action(agent_id, action.name());
        let description = Environment::new()
            .render_str(
                ACTION_DESCRIPTION_TEMPLATE,
                context! {
                    agent_id => agent_id.to_string(),
                    action => action.name(),
                    doc => action.doc(),
                    type_signature => action.type_signature(),
                },
            )
            .map_err(|error| BridgeDomainError::DescriptionRender {
                tool_name: name.to_string(),
                reason: error.to_string(),
            })?;

        Ok(Self {
            name,
            title: action.name().to_owned(),
            description,
            input_schema: action_input_schema(),
            target: ToolTarget::AgentAction(ActionTarget::new(agent_id, action.name())),
        })
    }

    /// Builds the definition of a built-in control tool.
    #[must_use]
    pub fn control(tool: ControlTool) -> Self {
        Self {
            name: ToolName::from_static(tool.as_str()),
            title: tool.as_str().to_owned(),
            description: tool.description().to_owned(),
            input_schema: tool.input_schema(),
            target: ToolTarget::Control(tool),
        }
    }

    /// Returns the registered name.
    #[must_use]
    pub const fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the human-readable title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description shown to tool-calling clients.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the JSON schema of accepted arguments.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the call routing target.
    #[must_use]
    pub const fn target(&self) -> &ToolTarget {
        &self.target
    }

    /// Returns the forwarded action when this is a proxy tool.
    #[must_use]
    pub const fn action_target(&self) -> Option<&ActionTarget> {
        match &self.target {
            ToolTarget::AgentAction(target) => Some(target),
            ToolTarget::Control(_) => None,
        }
    }
}

fn action_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "args": {
                "type": "array",
                "description": "Positional arguments for the action."
            },
            "kwargs": {
                "type": "object",
                "description": "Keyword arguments for the action."
            }
        },
        "required": ["args", "kwargs"],
        "additionalProperties": false
    })
}

/// Arguments of a proxy tool call.
///
/// Action signatures are only known at runtime, so every proxy tool takes
/// exactly a positional list and a keyword mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolInvocation {
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: Map<String, Value>,
}

impl ToolInvocation {
    /// Creates an invocation from positional and keyword arguments.
    #[must_use]
    pub const fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    /// Creates an invocation with positional arguments only.
    #[must_use]
    pub fn positional(args: impl IntoIterator<Item = Value>) -> Self {
        Self::new(args.into_iter().collect(), Map::new())
    }
}

/// Arguments of the [`ControlTool::AddAgent`] tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddAgentArguments {
    /// Agent to register.
    pub agent_uid: AgentId,
}

/// Arguments of the [`ControlTool::DiscoverAgents`] tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverAgentsArguments {
    /// Class name to match.
    pub class_name: String,
    /// Optional module restriction.
    #[serde(default)]
    pub module: Option<String>,
    /// Whether subclasses match.
    #[serde(default = "subclasses_by_default")]
    pub allow_subclasses: bool,
}

const fn subclasses_by_default() -> bool {
    true
}

impl DiscoverAgentsArguments {
    /// Converts the arguments into a validated filter.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError`] when the class or module name is blank.
    pub fn into_filter(self) -> Result<DiscoveryFilter, BridgeDomainError> {
        let filter = DiscoveryFilter::new(self.class_name)?.with_subclasses(self.allow_subclasses);
        match self.module {
            Some(module) => filter.with_module(module),
            None => Ok(filter),
        }
    }
}
