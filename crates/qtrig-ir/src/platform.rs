//! Platform descriptor: per-gate timing and channel resources.
//!
//! A [`Platform`] maps gate names to a [`GateSpec`] holding the gate's
//! duration, the channel it drives and the codeword it latches there. It is
//! loaded once and shared read-only (usually behind an `Arc`) by every pass.
//!
//! # Instruction keys
//!
//! Keys are either *generic* (`"rx90"`), applying to any operands, or
//! *specialized* to concrete qubits (`"rx90 q0"`, `"cz q0,q1"`). Lookups try
//! the specialized key first, so a platform can route the same gate to a
//! different channel per qubit:
//!
//! ```
//! use qtrig_ir::{ChannelId, Codeword, GateSpec, Platform, QubitId};
//!
//! let mut platform = Platform::new("spin_demo", 2, 5);
//! platform.add_instruction("rx90 q0", GateSpec::new(145, 1).on_channel(4, 1)).unwrap();
//! platform.add_instruction("rx90 q1", GateSpec::new(145, 1).on_channel(5, 1)).unwrap();
//!
//! let spec = platform.resolve("rx90", &[QubitId(1)]).unwrap();
//! assert_eq!(spec.channel, Some(ChannelId(5)));
//! assert_eq!(spec.codeword, Some(Codeword(1)));
//! ```
//!
//! # Decomposition rules
//!
//! Composite gates are described as a list of sub-instructions. Parametric
//! rules use `%i` to refer to the composite gate's operands; specialized
//! rules name concrete qubits:
//!
//! ```
//! use qtrig_ir::{Platform, QubitId};
//!
//! let mut platform = Platform::new("demo", 2, 5);
//! platform
//!     .add_decomposition("cnot %0,%1", &["mry90 %1", "cz %0,%1", "ry90 %1"])
//!     .unwrap();
//!
//! let rule = platform.decomposition_for("cnot", &[QubitId(1), QubitId(0)]).unwrap();
//! let gates = rule.expand(&[QubitId(1), QubitId(0)]);
//! assert_eq!(gates[1].to_string(), "cz q1,q0");
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::qubit::{ChannelId, Codeword, QubitId, format_qubits};

/// Timing and resource attributes of one platform instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    /// Duration in time units. Validated to be positive at schedule time.
    pub duration: i64,
    /// Channel the gate triggers on.
    pub channel: Option<ChannelId>,
    /// Codeword latched on the channel.
    pub codeword: Option<Codeword>,
    /// Number of qubit operands.
    pub arity: u32,
}

impl GateSpec {
    /// Create a spec with no channel resource attached.
    pub fn new(duration: i64, arity: u32) -> Self {
        Self {
            duration,
            channel: None,
            codeword: None,
            arity,
        }
    }

    /// Attach a channel and codeword.
    #[must_use]
    pub fn on_channel(mut self, channel: u32, codeword: u32) -> Self {
        self.channel = Some(ChannelId(channel));
        self.codeword = Some(Codeword(codeword));
        self
    }
}

/// Operand reference inside a decomposition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// `%i`: the i-th operand of the composite gate.
    Param(usize),
    /// `qN`: a fixed physical qubit.
    Fixed(QubitId),
}

/// One sub-instruction of a decomposition rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionStep {
    /// Name of the sub-instruction.
    pub name: String,
    /// Operands of the sub-instruction.
    pub operands: Vec<Operand>,
}

/// A composite gate expressed as an ordered list of sub-instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionRule {
    /// Composite gate name.
    pub name: String,
    /// Number of operands the composite gate takes.
    pub arity: usize,
    /// Sub-instructions in application order.
    pub steps: Vec<DecompositionStep>,
}

impl DecompositionRule {
    /// Instantiate the rule for concrete operands.
    ///
    /// `qubits` must have `self.arity` entries; parametric operands were
    /// bounds-checked when the rule was loaded.
    pub fn expand(&self, qubits: &[QubitId]) -> Vec<Gate> {
        self.steps
            .iter()
            .map(|step| {
                let operands = step.operands.iter().map(|op| match *op {
                    Operand::Param(i) => qubits[i],
                    Operand::Fixed(q) => q,
                });
                Gate::new(&step.name, operands)
            })
            .collect()
    }
}

/// Immutable descriptor of a hardware platform.
#[derive(Debug, Clone)]
pub struct Platform {
    name: String,
    qubit_count: u32,
    cycle_time: u64,
    /// Instruction specs keyed by normalized key (`"rx90"` or `"rx90 q0"`).
    instructions: FxHashMap<String, GateSpec>,
    /// Parametric decomposition rules keyed by (name, arity).
    rules: FxHashMap<(String, usize), DecompositionRule>,
    /// Decomposition rules specialized to concrete operands, keyed like instructions.
    specialized_rules: FxHashMap<String, DecompositionRule>,
    /// Every gate name mentioned by an instruction or rule key.
    known_names: FxHashSet<String>,
}

impl Platform {
    /// Create an empty platform.
    pub fn new(name: impl Into<String>, qubit_count: u32, cycle_time: u64) -> Self {
        Self {
            name: name.into(),
            qubit_count,
            cycle_time,
            instructions: FxHashMap::default(),
            rules: FxHashMap::default(),
            specialized_rules: FxHashMap::default(),
            known_names: FxHashSet::default(),
        }
    }

    /// Parse a platform from its JSON descriptor.
    pub fn from_json(source: &str) -> IrResult<Self> {
        let raw: RawPlatform = serde_json::from_str(source)?;
        raw.into_platform()
    }

    /// Load a platform descriptor from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> IrResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&source)
    }

    /// Platform name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits the platform provides.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// Length of one hardware cycle in time units.
    pub fn cycle_time(&self) -> u64 {
        self.cycle_time
    }

    /// Register an instruction under a generic or specialized key.
    ///
    /// Re-registering a key overwrites the previous spec and logs a warning.
    pub fn add_instruction(&mut self, key: &str, spec: GateSpec) -> IrResult<()> {
        let key = sanitize_instruction_name(key);
        let (name, operands) = parse_key(&key)?;

        if spec.arity == 0 {
            return Err(IrError::InvalidPlatform(format!(
                "instruction '{key}' has arity 0"
            )));
        }
        if !operands.is_empty() {
            if operands.len() != spec.arity as usize {
                return Err(IrError::InvalidPlatform(format!(
                    "instruction '{key}' names {} operands but declares arity {}",
                    operands.len(),
                    spec.arity
                )));
            }
            for op in &operands {
                match *op {
                    Operand::Fixed(q) => self.check_qubit(&key, q)?,
                    Operand::Param(_) => {
                        return Err(IrError::InvalidPlatform(format!(
                            "instruction '{key}' uses a parametric operand; only decomposition rules may"
                        )));
                    }
                }
            }
        }

        if self.instructions.insert(key.clone(), spec).is_some() {
            warn!("instruction '{key}' redefined: the old definition is overwritten");
        }
        debug!("instruction {key} loaded");
        self.known_names.insert(name);
        Ok(())
    }

    /// Register a decomposition rule.
    ///
    /// `key` is either parametric (`"cnot %0,%1"`) or specialized
    /// (`"cnot q0,q1"`). Every sub-instruction is a name followed by a comma
    /// separated operand list of `%i` or `qN` references.
    pub fn add_decomposition<S: AsRef<str>>(&mut self, key: &str, steps: &[S]) -> IrResult<()> {
        let key = sanitize_instruction_name(key);
        let (name, key_operands) = parse_key(&key)?;
        if key_operands.is_empty() {
            return Err(IrError::InvalidPlatform(format!(
                "decomposition '{key}' must list its operands"
            )));
        }

        let parametric = key_operands.iter().all(|op| matches!(op, Operand::Param(_)));
        let specialized = key_operands.iter().all(|op| matches!(op, Operand::Fixed(_)));
        if parametric {
            for (i, op) in key_operands.iter().enumerate() {
                if *op != Operand::Param(i) {
                    return Err(IrError::InvalidPlatform(format!(
                        "decomposition '{key}' must number its operands %0..%{}",
                        key_operands.len() - 1
                    )));
                }
            }
        } else if specialized {
            for op in &key_operands {
                if let Operand::Fixed(q) = *op {
                    self.check_qubit(&key, q)?;
                }
            }
        } else {
            return Err(IrError::InvalidPlatform(format!(
                "decomposition '{key}' mixes parametric and fixed operands"
            )));
        }

        let arity = key_operands.len();
        let mut parsed = Vec::with_capacity(steps.len());
        for step in steps {
            let step = sanitize_instruction_name(step.as_ref());
            let (step_name, operands) = parse_key(&step)?;
            for op in &operands {
                match *op {
                    Operand::Param(i) if i >= arity => {
                        return Err(IrError::InvalidPlatform(format!(
                            "decomposition '{key}': sub-instruction '{step}' refers to %{i} but the gate has {arity} operands"
                        )));
                    }
                    Operand::Fixed(q) => self.check_qubit(&key, q)?,
                    Operand::Param(_) => {}
                }
            }
            parsed.push(DecompositionStep {
                name: step_name,
                operands,
            });
        }

        let rule = DecompositionRule {
            name: name.clone(),
            arity,
            steps: parsed,
        };
        let replaced = if parametric {
            self.rules.insert((name.clone(), arity), rule).is_some()
        } else {
            self.specialized_rules.insert(key.clone(), rule).is_some()
        };
        if replaced {
            warn!("composite instruction '{key}' redefined: the old definition is overwritten");
        }
        debug!("composite instruction {key} loaded");
        self.known_names.insert(name);
        Ok(())
    }

    /// Find the spec for `name` applied to `qubits`, specialized key first.
    pub fn resolve(&self, name: &str, qubits: &[QubitId]) -> Option<&GateSpec> {
        if !qubits.is_empty() {
            let key = format!("{name} {}", format_qubits(qubits));
            if let Some(spec) = self.instructions.get(&key) {
                return Some(spec);
            }
        }
        self.instructions.get(name)
    }

    /// Check whether `name` on `qubits` is directly executable.
    ///
    /// A spec of a different arity does not count, so the gate is left to
    /// decomposition.
    pub fn is_native(&self, name: &str, qubits: &[QubitId]) -> bool {
        self.resolve(name, qubits)
            .is_some_and(|spec| spec.arity as usize == qubits.len())
    }

    /// Check whether any instruction or rule mentions `name`.
    pub fn knows(&self, name: &str) -> bool {
        self.known_names.contains(name)
    }

    /// Find a decomposition rule for `name` on `qubits`, specialized first.
    pub fn decomposition_for(&self, name: &str, qubits: &[QubitId]) -> Option<&DecompositionRule> {
        let key = format!("{name} {}", format_qubits(qubits));
        self.specialized_rules
            .get(&key)
            .or_else(|| self.rules.get(&(name.to_string(), qubits.len())))
    }

    /// Iterate over `(key, spec)` pairs in key order.
    pub fn instructions(&self) -> impl Iterator<Item = (&str, &GateSpec)> {
        let sorted: BTreeMap<&str, &GateSpec> = self
            .instructions
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        sorted.into_iter()
    }

    /// Number of registered instruction keys.
    pub fn num_instructions(&self) -> usize {
        self.instructions.len()
    }

    fn check_qubit(&self, key: &str, qubit: QubitId) -> IrResult<()> {
        if qubit.0 >= self.qubit_count {
            return Err(IrError::InvalidPlatform(format!(
                "'{key}' refers to {qubit} but the platform has {} qubits",
                self.qubit_count
            )));
        }
        Ok(())
    }
}

/// Normalize an instruction name: lower case, trimmed, single spaces, no
/// spaces around commas.
pub fn sanitize_instruction_name(name: &str) -> String {
    let collapsed = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a normalized key into its name and operand list.
fn parse_key(key: &str) -> IrResult<(String, Vec<Operand>)> {
    let (name, rest) = match key.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (key, ""),
    };
    if name.is_empty() {
        return Err(IrError::InvalidPlatform("empty instruction name".into()));
    }
    if rest.is_empty() {
        return Ok((name.to_string(), vec![]));
    }
    let operands = rest
        .split(',')
        .map(|token| parse_operand(key, token))
        .collect::<IrResult<Vec<_>>>()?;
    Ok((name.to_string(), operands))
}

fn parse_operand(key: &str, token: &str) -> IrResult<Operand> {
    let bad = || IrError::InvalidPlatform(format!("malformed operand '{token}' in '{key}'"));
    if let Some(index) = token.strip_prefix('%') {
        index.parse().map(Operand::Param).map_err(|_| bad())
    } else if let Some(index) = token.strip_prefix('q') {
        index
            .parse()
            .map(|q| Operand::Fixed(QubitId(q)))
            .map_err(|_| bad())
    } else {
        Err(bad())
    }
}

// ============================================================================
// JSON descriptor
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPlatform {
    name: String,
    hardware_settings: RawHardwareSettings,
    instructions: BTreeMap<String, RawInstruction>,
    #[serde(default)]
    gate_decomposition: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawHardwareSettings {
    qubit_number: u32,
    cycle_time: u64,
}

#[derive(Debug, Deserialize)]
struct RawInstruction {
    duration: i64,
    #[serde(default)]
    channel: Option<u32>,
    #[serde(default)]
    codeword: Option<u32>,
    #[serde(default)]
    arity: Option<u32>,
}

impl RawPlatform {
    fn into_platform(self) -> IrResult<Platform> {
        if self.hardware_settings.cycle_time == 0 {
            return Err(IrError::InvalidPlatform("cycle_time must be positive".into()));
        }
        let mut platform = Platform::new(
            self.name,
            self.hardware_settings.qubit_number,
            self.hardware_settings.cycle_time,
        );

        for (key, raw) in self.instructions {
            // Specialized keys imply their arity; generic keys default to one operand.
            let implied = parse_key(&sanitize_instruction_name(&key))?.1.len();
            let arity = match raw.arity {
                Some(arity) => arity,
                None if implied > 0 => u32::try_from(implied)
                    .map_err(|_| IrError::InvalidPlatform(format!("too many operands in '{key}'")))?,
                None => 1,
            };
            let spec = GateSpec {
                duration: raw.duration,
                channel: raw.channel.map(ChannelId),
                codeword: raw.codeword.map(Codeword),
                arity,
            };
            platform.add_instruction(&key, spec)?;
        }

        for (key, steps) in self.gate_decomposition {
            platform.add_decomposition(&key, &steps)?;
        }

        debug!(
            "loaded platform '{}' with {} instructions",
            platform.name,
            platform.instructions.len()
        );
        Ok(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIN_DEMO: &str = r#"{
        "name": "spin_qubit_demo",
        "hardware_settings": { "qubit_number": 2, "cycle_time": 5 },
        "instructions": {
            "rx90 q0":     { "duration": 145, "channel": 4, "codeword": 1 },
            "ry90 q0":     { "duration": 145, "channel": 4, "codeword": 3 },
            "ry90 q1":     { "duration": 145, "channel": 5, "codeword": 3 },
            "identity":    { "duration": 125, "channel": 4, "codeword": 5 },
            "CZ Q0 , Q1":  { "duration": 300, "channel": 6, "codeword": 7, "arity": 2 }
        },
        "gate_decomposition": {
            "cnot %0,%1": ["mry90 %1", "cz %0,%1", "ry90 %1"]
        }
    }"#;

    #[test]
    fn test_sanitize_instruction_name() {
        assert_eq!(sanitize_instruction_name("  CZ   q0 ,  q1 "), "cz q0,q1");
        assert_eq!(sanitize_instruction_name("rx90"), "rx90");
    }

    #[test]
    fn test_load_json() {
        let platform = Platform::from_json(SPIN_DEMO).unwrap();
        assert_eq!(platform.name(), "spin_qubit_demo");
        assert_eq!(platform.qubit_count(), 2);
        assert_eq!(platform.cycle_time(), 5);
        assert_eq!(platform.num_instructions(), 5);

        let cz = platform.resolve("cz", &[QubitId(0), QubitId(1)]).unwrap();
        assert_eq!(cz.arity, 2);
        assert_eq!(cz.channel, Some(ChannelId(6)));
    }

    #[test]
    fn test_specialized_before_generic() {
        let mut platform = Platform::new("p", 2, 1);
        platform
            .add_instruction("x", GateSpec::new(20, 1).on_channel(1, 1))
            .unwrap();
        platform
            .add_instruction("x q1", GateSpec::new(20, 1).on_channel(2, 1))
            .unwrap();

        assert_eq!(
            platform.resolve("x", &[QubitId(0)]).unwrap().channel,
            Some(ChannelId(1))
        );
        assert_eq!(
            platform.resolve("x", &[QubitId(1)]).unwrap().channel,
            Some(ChannelId(2))
        );
    }

    #[test]
    fn test_specialized_only_is_not_native_elsewhere() {
        let platform = Platform::from_json(SPIN_DEMO).unwrap();
        assert!(platform.is_native("rx90", &[QubitId(0)]));
        assert!(!platform.is_native("rx90", &[QubitId(1)]));
        assert!(platform.knows("rx90"));
        assert!(platform.knows("cnot"));
        assert!(!platform.knows("toffoli"));
    }

    #[test]
    fn test_generic_spec_of_other_arity_is_not_native() {
        let platform = Platform::from_json(SPIN_DEMO).unwrap();
        assert!(platform.is_native("identity", &[QubitId(1)]));
        assert!(!platform.is_native("identity", &[QubitId(0), QubitId(1)]));
        assert!(platform.is_native("cz", &[QubitId(0), QubitId(1)]));
    }

    #[test]
    fn test_decomposition_expand() {
        let platform = Platform::from_json(SPIN_DEMO).unwrap();
        let rule = platform
            .decomposition_for("cnot", &[QubitId(0), QubitId(1)])
            .unwrap();
        let gates = rule.expand(&[QubitId(0), QubitId(1)]);
        let names: Vec<_> = gates.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["mry90 q1", "cz q0,q1", "ry90 q1"]);
    }

    #[test]
    fn test_specialized_decomposition_wins() {
        let mut platform = Platform::new("p", 2, 1);
        platform.add_decomposition("swap %0,%1", &["a %0"]).unwrap();
        platform.add_decomposition("swap q1,q0", &["b q0"]).unwrap();

        let generic = platform
            .decomposition_for("swap", &[QubitId(0), QubitId(1)])
            .unwrap();
        assert_eq!(generic.steps[0].name, "a");
        let special = platform
            .decomposition_for("swap", &[QubitId(1), QubitId(0)])
            .unwrap();
        assert_eq!(special.steps[0].name, "b");
    }

    #[test]
    fn test_rejects_out_of_range_param() {
        let mut platform = Platform::new("p", 2, 1);
        let err = platform
            .add_decomposition("cnot %0,%1", &["cz %0,%2"])
            .unwrap_err();
        assert!(matches!(err, IrError::InvalidPlatform(_)));
    }

    #[test]
    fn test_rejects_arity_mismatch_and_bad_qubit() {
        let mut platform = Platform::new("p", 2, 1);
        assert!(
            platform
                .add_instruction("cz q0,q1", GateSpec::new(40, 1))
                .is_err()
        );
        assert!(platform.add_instruction("x q7", GateSpec::new(20, 1)).is_err());
        assert!(platform.add_instruction("x", GateSpec::new(20, 0)).is_err());
    }

    #[test]
    fn test_rejects_zero_cycle_time() {
        let json = r#"{
            "name": "p",
            "hardware_settings": { "qubit_number": 1, "cycle_time": 0 },
            "instructions": {}
        }"#;
        assert!(matches!(
            Platform::from_json(json),
            Err(IrError::InvalidPlatform(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Platform::from_json("{"), Err(IrError::Json(_))));
    }
}
