// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Two-phase network construction
//!
//! An [`Assembly`] accumulates elements and explicit bindings. [`Assembly::finalize`] binds
//! every remaining input port to a default source and hands everything over to a
//! [`RunnableNetwork`]; nothing can be added or rewired after that point.
//!
//! ```ignore
//! let mut net = Assembly::new("demo", 1e-4)?;
//! net.add_spike_generator("drive", GeneratorSpec::Periodic { period: 5e-3, delay: 0.0 })?;
//! net.add_synapse("syn", SynapseParams::default())?;
//! net.add_neuron("cell", NeuronParams::default())?;
//! net.connect("drive", "spike", "syn", "spike")?;
//! net.connect("syn", "psc", "cell", "psc")?;
//! net.connect("cell", "vm", "syn", "post")?;
//! let mut runnable = net.finalize();
//! runnable.run(0.1)?;
//! ```

use tantrika_config::TantrikaConfig;
use tantrika_npu_neural::{
    GeneratorSpec, Neuron, NeuronGroup, NeuronParams, PortDirection, Result, SignalId, SignalKind,
    SignalValue, SpikeGenerator, SpikeGeneratorGroup, SpikeGeneratorKind, Synapse, SynapseGroup,
    SynapseKernel, SynapseParams, TantrikaError,
};
use tracing::{debug, info};

use crate::element::{ElementId, ElementSpec, ElementType, ExternalSignal, NetworkElement};
use crate::recorder::{Recorder, TimeSeriesRecorder};
use crate::registry::{validate_path, Registry};
use crate::runnable::RunnableNetwork;
use crate::scheduler::Clock;
use crate::wiring::{self, Binding, PlannedBinding, PortAddress, Wiring};

/// Neuron model names accepted by [`Assembly::add_neuron_by_type`]
pub const SUPPORTED_NEURON_TYPES: [&str; 1] = ["iaf"];

/// Seed of member `member` of element `id`, derived from the network seed.
///
/// splitmix64 finaliser, so neighbouring ids produce unrelated streams.
pub fn derive_seed(base: u64, id: ElementId, member: usize) -> u64 {
    let mut z = base
        .wrapping_add((id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((member as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Network under construction
#[derive(Debug)]
pub struct Assembly {
    path: String,
    clock: Clock,
    seed: u64,
    neuron_defaults: NeuronParams,
    synapse_defaults: SynapseParams,
    csv_delimiter: char,
    record_neurons: bool,

    registry: Registry,
    wiring: Wiring,
    recorded: Vec<SignalId>,
}

impl Assembly {
    /// Start an empty network with tick period `dt` (seconds).
    pub fn new(path: impl Into<String>, dt: f64) -> Result<Self> {
        let path = path.into();
        validate_path(&path)?;
        let clock = Clock::new(dt)?;
        Ok(Self {
            path,
            clock,
            seed: 0,
            neuron_defaults: NeuronParams::default(),
            synapse_defaults: SynapseParams::default(),
            csv_delimiter: ',',
            record_neurons: false,
            registry: Registry::new(),
            wiring: Wiring::new(),
            recorded: Vec::new(),
        })
    }

    /// Clock period, base seed, default parameters and output options from configuration.
    pub fn from_config(path: impl Into<String>, config: &TantrikaConfig) -> Result<Self> {
        let mut assembly = Self::new(path, config.simulation.dt)?;

        let n = &config.neuron;
        let neuron = NeuronParams::from_rc(n.cm, n.tau / n.cm, n.em)
            .with_threshold(n.em + n.threshold_offset)
            .with_refractory(n.refractory)
            .with_noise(n.noise);
        neuron.validate()?;

        let s = &config.synapse;
        let kernel: SynapseKernel = s.kernel.parse()?;
        let synapse = SynapseParams::new(s.gbar, s.tau, s.esyn, kernel)
            .with_cutoff(s.negligible_after_taus);
        synapse.validate()?;

        assembly.neuron_defaults = neuron;
        assembly.synapse_defaults = synapse;
        assembly.seed = config.simulation.seed;
        assembly.record_neurons = config.simulation.record_neurons;
        assembly.csv_delimiter =
            config
                .output
                .delimiter()
                .ok_or_else(|| TantrikaError::InvalidParameter {
                    name: "csv_delimiter",
                    value: config.output.csv_delimiter.chars().count() as f64,
                    reason: "must be exactly one character",
                })?;
        Ok(assembly)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Base seed for elements added from now on.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Record every neuron's `vm` and `spike` on finalize.
    pub fn set_record_neurons(&mut self, enabled: bool) {
        self.record_neurons = enabled;
    }

    pub fn set_csv_delimiter(&mut self, delimiter: char) {
        self.csv_delimiter = delimiter;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dt(&self) -> f64 {
        self.clock.period()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn neuron_defaults(&self) -> &NeuronParams {
        &self.neuron_defaults
    }

    pub fn synapse_defaults(&self) -> &SynapseParams {
        &self.synapse_defaults
    }

    /// Construct an element and register it under `path`.
    ///
    /// Fails on an invalid or duplicate path and on invalid parameters; nothing is registered
    /// in that case.
    pub fn add_element(&mut self, path: &str, spec: ElementSpec) -> Result<ElementId> {
        validate_path(path)?;
        if self.registry.contains(path) {
            return Err(TantrikaError::DuplicatePath(path.to_string()));
        }
        let id = ElementId(self.registry.len());
        let base = self.seed;
        let element_type = spec.element_type();

        let element = match spec {
            ElementSpec::Neuron(params) => {
                let mut neuron = Neuron::new(path, params)?;
                neuron.set_seed(derive_seed(base, id, 0))?;
                NetworkElement::Neuron(neuron)
            }
            ElementSpec::NeuronGroup { size, params } => {
                let mut group = NeuronGroup::neurons(path, size, params)?;
                for (i, neuron) in group.members_mut().iter_mut().enumerate() {
                    neuron.set_seed(derive_seed(base, id, i))?;
                }
                NetworkElement::NeuronGroup(group)
            }
            ElementSpec::Synapse(params) => NetworkElement::Synapse(Synapse::new(path, params)?),
            ElementSpec::SynapseGroup { size, params } => {
                NetworkElement::SynapseGroup(SynapseGroup::synapses(path, size, params)?)
            }
            ElementSpec::SpikeGenerator(spec) => {
                spec.validate()?;
                NetworkElement::SpikeGenerator(spec.build(path, derive_seed(base, id, 0))?)
            }
            ElementSpec::SpikeGeneratorGroup { size, spec } => NetworkElement::SpikeGeneratorGroup(
                SpikeGeneratorGroup::generators(path, size, spec, |i| derive_seed(base, id, i))?,
            ),
            ElementSpec::Signal { kind, initial } => {
                NetworkElement::Signal(ExternalSignal::new(path, kind, initial)?)
            }
        };

        let size = element.size();
        let id = self.registry.insert(element)?;
        if let Some(element) = self.registry.get(id) {
            self.wiring.register_outputs(id, element);
        }
        info!(network = %self.path, path, element_type = %element_type, size, "Added element");
        Ok(id)
    }

    pub fn add_neuron(&mut self, path: &str, params: NeuronParams) -> Result<ElementId> {
        self.add_element(path, ElementSpec::Neuron(params))
    }

    pub fn add_neuron_group(
        &mut self,
        path: &str,
        size: usize,
        params: NeuronParams,
    ) -> Result<ElementId> {
        self.add_element(path, ElementSpec::NeuronGroup { size, params })
    }

    pub fn add_synapse(&mut self, path: &str, params: SynapseParams) -> Result<ElementId> {
        self.add_element(path, ElementSpec::Synapse(params))
    }

    pub fn add_synapse_group(
        &mut self,
        path: &str,
        size: usize,
        params: SynapseParams,
    ) -> Result<ElementId> {
        self.add_element(path, ElementSpec::SynapseGroup { size, params })
    }

    pub fn add_spike_generator(&mut self, path: &str, spec: GeneratorSpec) -> Result<ElementId> {
        self.add_element(path, ElementSpec::SpikeGenerator(spec))
    }

    pub fn add_spike_generator_group(
        &mut self,
        path: &str,
        size: usize,
        spec: GeneratorSpec,
    ) -> Result<ElementId> {
        self.add_element(path, ElementSpec::SpikeGeneratorGroup { size, spec })
    }

    /// Register a driver-controlled source with a single output port `out`.
    pub fn add_signal(
        &mut self,
        path: &str,
        kind: SignalKind,
        initial: SignalValue,
    ) -> Result<ElementId> {
        self.add_element(path, ElementSpec::Signal { kind, initial })
    }

    /// Add a neuron by model name with the default neuron parameters.
    pub fn add_neuron_by_type(&mut self, path: &str, model: &str) -> Result<ElementId> {
        let model = model.to_ascii_lowercase();
        if !SUPPORTED_NEURON_TYPES.contains(&model.as_str()) {
            return Err(TantrikaError::NotImplemented(format!(
                "neuron model '{}'",
                model
            )));
        }
        self.add_neuron(path, self.neuron_defaults)
    }

    /// Add a synapse by kernel name (`alpha`, `exp`).
    pub fn add_synapse_by_type(
        &mut self,
        path: &str,
        gbar: f64,
        tau: f64,
        esyn: f64,
        kernel: &str,
    ) -> Result<ElementId> {
        let kernel: SynapseKernel = kernel.parse()?;
        let params = SynapseParams::new(gbar, tau, esyn, kernel)
            .with_cutoff(self.synapse_defaults.negligible_after_taus);
        self.add_synapse(path, params)
    }

    /// Add a generator group by variant name (`periodic`, `poisson`).
    ///
    /// `rate` is the period for periodic generators and lambda for Poisson ones.
    pub fn add_spike_generator_group_by_type(
        &mut self,
        path: &str,
        size: usize,
        kind: &str,
        rate: f64,
    ) -> Result<ElementId> {
        let kind: SpikeGeneratorKind = kind.parse()?;
        self.add_spike_generator_group(path, size, GeneratorSpec::from_kind(kind, rate, 0.0))
    }

    /// Adjust a neuron before the simulation starts.
    pub fn neuron_mut(&mut self, endpoint: &str) -> Result<&mut Neuron> {
        wiring::member_mut(&mut self.registry, endpoint, "Neuron", NetworkElement::neurons_mut)
    }

    /// Adjust a spike generator (delay, seed) before the simulation starts.
    pub fn spike_generator_mut(&mut self, endpoint: &str) -> Result<&mut SpikeGenerator> {
        wiring::member_mut(
            &mut self.registry,
            endpoint,
            "SpikeGenerator",
            NetworkElement::generators_mut,
        )
    }

    /// Bind `src.src_port` (an output) to `tgt.tgt_port` (an input).
    ///
    /// Either side may be `path` or `path[i]`. Returns the number of bindings made. The whole
    /// request is validated first; on error no binding is applied.
    pub fn connect(
        &mut self,
        src: &str,
        src_port: &str,
        tgt: &str,
        tgt_port: &str,
    ) -> Result<usize> {
        let planned = self.plan_connect(src, src_port, tgt, tgt_port, &[])?;
        self.wiring.apply(&self.registry, &planned);
        info!(
            network = %self.path,
            source = %format!("{}.{}", src, src_port),
            target = %format!("{}.{}", tgt, tgt_port),
            bindings = planned.len(),
            "Connecting"
        );
        Ok(planned.len())
    }

    /// Wire `pre → syn → post`: `pre.spike → syn.spike`, `syn.psc → post.psc` and
    /// `post.vm → syn.post`. All three bindings are validated before any is applied.
    pub fn connect_synapse(&mut self, pre: &str, syn: &str, post: &str) -> Result<usize> {
        let mut planned = self.plan_connect(pre, "spike", syn, "spike", &[])?;
        let psc = self.plan_connect(syn, "psc", post, "psc", &planned)?;
        planned.extend(psc);
        let vm = self.plan_connect(post, "vm", syn, "post", &planned)?;
        planned.extend(vm);

        self.wiring.apply(&self.registry, &planned);
        info!(network = %self.path, pre, syn, post, bindings = planned.len(), "Connecting synapse");
        Ok(planned.len())
    }

    fn plan_connect(
        &self,
        src: &str,
        src_port: &str,
        tgt: &str,
        tgt_port: &str,
        pending: &[PlannedBinding],
    ) -> Result<Vec<PlannedBinding>> {
        let source = wiring::resolve_port(&self.registry, src, src_port, PortDirection::Output)?;
        let target = wiring::resolve_port(&self.registry, tgt, tgt_port, PortDirection::Input)?;
        self.wiring.plan(&self.registry, &source, &target, pending)
    }

    /// Designate an output port for recording; a group designates every member.
    ///
    /// Returns the number of newly designated signals.
    pub fn record(&mut self, endpoint: &str, port: &str) -> Result<usize> {
        let resolved =
            wiring::resolve_port(&self.registry, endpoint, port, PortDirection::Output)?;
        let mut added = 0;
        for &member in &resolved.members {
            if let Some(signal) = self.wiring.output_signal(resolved.address(member)) {
                if !self.recorded.contains(&signal) {
                    self.recorded.push(signal);
                    added += 1;
                }
            }
        }
        debug!(endpoint, port, added, "Designated signals for recording");
        Ok(added)
    }

    /// Attach a default zero source to every input port that is still unbound.
    ///
    /// Idempotent; [`Assembly::finalize`] calls it as well.
    pub fn bind_unbound_ports(&mut self) -> usize {
        let bound = self.wiring.bind_unbound(&self.registry);
        if bound > 0 {
            debug!(network = %self.path, bound, "Bound unbound ports to default sources");
        }
        bound
    }

    pub fn bindings(&self) -> &[Binding] {
        self.wiring.bindings()
    }

    pub fn find_group(&self, path: &str) -> Result<&NetworkElement> {
        self.registry.find_group(path)
    }

    pub fn find_elements_by_type(&self, element_type: ElementType) -> Vec<&NetworkElement> {
        self.registry.find_elements_by_type(element_type)
    }

    pub fn describe(&self, path: &str) -> Result<String> {
        Ok(self.registry.find_group(path)?.describe())
    }

    /// Finish elaboration with the in-memory time-series recorder.
    pub fn finalize(self) -> RunnableNetwork<TimeSeriesRecorder> {
        self.finalize_with_recorder(TimeSeriesRecorder::new())
    }

    /// Finish elaboration: bind unbound ports, add neuron recordings if enabled and build
    /// the runnable network.
    pub fn finalize_with_recorder<R: Recorder>(mut self, recorder: R) -> RunnableNetwork<R> {
        self.bind_unbound_ports();

        if self.record_neurons {
            for (id, element) in self.registry.iter() {
                if element.neurons().is_empty() {
                    continue;
                }
                for member in 0..element.size() {
                    for port in [Neuron::PORT_VM, Neuron::PORT_SPIKE] {
                        let address = PortAddress {
                            element: id,
                            member,
                            port,
                        };
                        if let Some(signal) = self.wiring.output_signal(address) {
                            if !self.recorded.contains(&signal) {
                                self.recorded.push(signal);
                            }
                        }
                    }
                }
            }
        }

        info!(
            network = %self.path,
            elements = self.registry.len(),
            bindings = self.wiring.bindings().len(),
            signals = self.wiring.signals().len(),
            recorded = self.recorded.len(),
            "Network finalized"
        );
        RunnableNetwork::new(
            self.path,
            self.clock,
            self.csv_delimiter,
            self.registry,
            self.wiring,
            self.recorded,
            recorder,
        )
    }
}
