use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalizes a directive identifier to its canonical (upper) case.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

/// Closed set of directive categories. Declaration order is the advertisement order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectiveCategory {
    /// Injuries, illness and body parts.
    Health,
    /// Thoughts and mood offsets.
    Mood,
    /// Opinions and relationships.
    Social,
    /// Skill levels and experience.
    Skills,
    /// Captivity, resistance and recruitment.
    Prisoner,
    /// Work assignments.
    Work,
    /// Food, rest and other needs.
    Needs,
    /// Traits and other lasting changes.
    Transform,
    /// Carried items.
    Inventory,
    /// Location changes.
    Movement,
    /// Anything that fits nowhere else.
    Special,
}

impl DirectiveCategory {
    /// Every category in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Health,
        Self::Mood,
        Self::Social,
        Self::Skills,
        Self::Prisoner,
        Self::Work,
        Self::Needs,
        Self::Transform,
        Self::Inventory,
        Self::Movement,
        Self::Special,
    ];

    /// Returns a short human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Mood => "Mood",
            Self::Social => "Social",
            Self::Skills => "Skills",
            Self::Prisoner => "Prisoner",
            Self::Work => "Work",
            Self::Needs => "Needs",
            Self::Transform => "Transform",
            Self::Inventory => "Inventory",
            Self::Movement => "Movement",
            Self::Special => "Special",
        }
    }
}

impl fmt::Display for DirectiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Advisory strictness tag read by host-side policy. The engine never enforces it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ValidationLevel {
    /// Loose checks, cosmetic effects.
    Permissive,
    /// Default level.
    #[default]
    Moderate,
    /// Effects with lasting consequences.
    Strict,
}

/// Type accepted by a positional parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Signed integer.
    Integer,
    /// Finite decimal number.
    Number,
    /// Single token without whitespace.
    Word,
    /// Any non-blank text.
    Text,
}

impl ParamKind {
    /// Whether `raw` is a well-formed value of this kind.
    #[must_use]
    pub fn accepts(self, raw: &str) -> bool {
        let value = raw.trim();
        match self {
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Number => value.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Word => !value.is_empty() && !value.contains(char::is_whitespace),
            Self::Text => !value.is_empty(),
        }
    }

    /// Returns a short label used in usage strings and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Word => "word",
            Self::Text => "text",
        }
    }
}

/// Declared positional parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    /// Name shown in advertisements.
    pub name: String,
    /// Accepted value kind.
    pub kind: ParamKind,
    /// Whether the parameter must be present.
    pub required: bool,
}

impl ParamSpec {
    /// Mandatory parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Parameter that may be omitted.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Violation of a directive's parameter schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Fewer parameters than the required count.
    #[error("expected at least {expected} parameter(s), got {got}")]
    TooFew {
        /// Required count.
        expected: usize,
        /// Supplied count.
        got: usize,
    },
    /// More parameters than declared.
    #[error("expected at most {max} parameter(s), got {got}")]
    TooMany {
        /// Declared count.
        max: usize,
        /// Supplied count.
        got: usize,
    },
    /// A parameter does not parse as its declared kind.
    #[error("parameter {index} (`{name}`) is not a valid {}", .expected.label())]
    BadValue {
        /// Zero-based position.
        index: usize,
        /// Declared name.
        name: String,
        /// Declared kind.
        expected: ParamKind,
    },
}

/// Static description of a directive: identity, category, advertisement text and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectiveDefinition {
    /// Canonical upper-case identifier.
    pub id: String,
    /// Category used for grouping and ranking.
    pub category: DirectiveCategory,
    /// Advertised description.
    pub description: String,
    /// Advisory strictness tag.
    pub validation: ValidationLevel,
    /// Ordered positional parameters.
    pub params: Vec<ParamSpec>,
    /// Free-form labels consumed by relevance rules (e.g. `injury:any`).
    pub tags: IndexSet<String>,
}

impl DirectiveDefinition {
    /// Creates a definition with no parameters and no tags.
    #[must_use]
    pub fn new(
        id: impl AsRef<str>,
        category: DirectiveCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: normalize_id(id.as_ref()),
            category,
            description: description.into(),
            validation: ValidationLevel::default(),
            params: Vec::new(),
            tags: IndexSet::new(),
        }
    }

    /// Sets the strictness tag.
    #[must_use]
    pub fn validation(mut self, validation: ValidationLevel) -> Self {
        self.validation = validation;
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Adds a relevance tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether the definition carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Tags under `prefix:`, with the prefix removed.
    pub fn tags_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags.iter().filter_map(move |tag| {
            tag.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(':'))
        })
    }

    /// Number of parameters that must be supplied.
    #[must_use]
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|spec| spec.required).count()
    }

    /// Checks arity and kinds of `params` against the declared schema.
    pub fn validate_params(&self, params: &[String]) -> Result<(), SchemaError> {
        let required = self.required_params();
        if params.len() < required {
            return Err(SchemaError::TooFew {
                expected: required,
                got: params.len(),
            });
        }
        if params.len() > self.params.len() {
            return Err(SchemaError::TooMany {
                max: self.params.len(),
                got: params.len(),
            });
        }
        for (index, (raw, spec)) in params.iter().zip(&self.params).enumerate() {
            if !spec.kind.accepts(raw) {
                return Err(SchemaError::BadValue {
                    index,
                    name: spec.name.clone(),
                    expected: spec.kind,
                });
            }
        }
        Ok(())
    }

    /// Token template shown to the generator, e.g. `[ACTION:HEAL:part?]`.
    #[must_use]
    pub fn usage(&self) -> String {
        let mut usage = format!("[ACTION:{}", self.id);
        for spec in &self.params {
            usage.push(':');
            usage.push_str(&spec.name);
            if !spec.required {
                usage.push('?');
            }
        }
        usage.push(']');
        usage
    }
}

/// Positional parameters of one invocation with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    raw: &'a [String],
}

impl<'a> Params<'a> {
    /// Wraps raw parameters.
    #[must_use]
    pub const fn new(raw: &'a [String]) -> Self {
        Self { raw }
    }

    /// Parameter-less view used for availability checks.
    #[must_use]
    pub const fn empty() -> Params<'static> {
        Params { raw: &[] }
    }

    /// Number of supplied parameters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether no parameters were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Raw parameter slice.
    #[must_use]
    pub const fn as_slice(&self) -> &'a [String] {
        self.raw
    }

    /// Trimmed text at `index`; blank values read as absent.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&'a str> {
        self.raw
            .get(index)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Integer at `index`.
    #[must_use]
    pub fn int(&self, index: usize) -> Option<i64> {
        self.text(index).and_then(|value| value.parse().ok())
    }

    /// Finite number at `index`.
    #[must_use]
    pub fn number(&self, index: usize) -> Option<f64> {
        self.text(index)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }
}

/// One parsed occurrence of a directive token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    /// Canonical upper-case identifier.
    pub id: String,
    /// Positional parameters, verbatim.
    pub params: Vec<String>,
    /// Character offset of the token in the source text.
    pub offset: usize,
    /// Zero-based position among the batch's invocations.
    pub ordinal: usize,
}

impl Invocation {
    /// Typed view over the parameters.
    #[must_use]
    pub fn params(&self) -> Params<'_> {
        Params::new(&self.params)
    }
}

/// Successful effect reported by a directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectiveEffect {
    /// Terse machine-oriented status, e.g. `healed:2`.
    pub status: String,
    /// Display text appended to the conversation.
    pub narrative: String,
}

impl DirectiveEffect {
    /// Creates an effect.
    #[must_use]
    pub fn new(status: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            narrative: narrative.into(),
        }
    }
}

/// Failure raised by a directive while mutating agent state.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// Refusal whose message is safe to show to players.
    #[error("{0}")]
    Rejected(String),
    /// A parameter passed the schema but is unusable.
    #[error("invalid parameter `{name}`: {detail}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Diagnostic detail.
        detail: String,
    },
    /// Agent state does not allow the mutation.
    #[error("agent state: {0}")]
    AgentState(String),
    /// Anything else.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DirectiveError {
    /// Player-facing narrative; technical detail stays in the diagnostic log.
    #[must_use]
    pub fn narrative(&self, id: &str) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            _ => format!("{id} could not be carried out"),
        }
    }

    /// Stable short code for the result string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::AgentState(_) => "agent_state",
            Self::Internal(_) => "internal",
        }
    }
}

/// Outcome class of one invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Directive applied.
    Success,
    /// Gate, quota or schema refused the invocation.
    PreconditionFailed,
    /// Identifier not in the catalog.
    UnknownDirective,
    /// Directive failed while executing.
    ExecutionError,
}

/// Reported result of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Canonical identifier as parsed.
    pub directive_id: String,
    /// Outcome class.
    pub outcome: OutcomeKind,
    /// Short machine-oriented result.
    pub result: String,
    /// Display text.
    pub narrative: String,
    /// Character offset of the token in the source text.
    pub offset: usize,
}

impl ExecutionResult {
    pub(crate) fn success(invocation: &Invocation, effect: DirectiveEffect) -> Self {
        Self {
            directive_id: invocation.id.clone(),
            outcome: OutcomeKind::Success,
            result: effect.status,
            narrative: effect.narrative,
            offset: invocation.offset,
        }
    }

    pub(crate) fn unknown(invocation: &Invocation) -> Self {
        Self {
            directive_id: invocation.id.clone(),
            outcome: OutcomeKind::UnknownDirective,
            result: "unknown".into(),
            narrative: format!("Unknown directive: {}", invocation.id),
            offset: invocation.offset,
        }
    }

    pub(crate) fn denied(invocation: &Invocation, reason: impl fmt::Display) -> Self {
        Self {
            directive_id: invocation.id.clone(),
            outcome: OutcomeKind::PreconditionFailed,
            result: reason.to_string(),
            narrative: format!("Cannot execute {}", invocation.id),
            offset: invocation.offset,
        }
    }

    pub(crate) fn failed(invocation: &Invocation, error: &DirectiveError) -> Self {
        Self {
            directive_id: invocation.id.clone(),
            outcome: OutcomeKind::ExecutionError,
            result: format!("error:{}", error.code()),
            narrative: error.narrative(&invocation.id),
            offset: invocation.offset,
        }
    }

    pub(crate) fn panicked(invocation: &Invocation) -> Self {
        Self {
            directive_id: invocation.id.clone(),
            outcome: OutcomeKind::ExecutionError,
            result: "error:panic".into(),
            narrative: format!("{} could not be carried out", invocation.id),
            offset: invocation.offset,
        }
    }

    /// Whether the directive was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == OutcomeKind::Success
    }
}
