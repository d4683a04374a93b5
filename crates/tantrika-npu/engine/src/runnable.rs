// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Finalised network: the per-tick update loop
//!
//! ## Tick phases
//! 1. **Integrate**: every neuron reads `inject` and the sum of its `psc` sources (written
//!    during the previous tick), then writes `vm` and `spike`.
//! 2. **Synapse**: every synapse reads its `spike` source (raised in phase 1 of this tick,
//!    or by a generator during the previous tick) and its `post` voltage as latched at the
//!    start of phase 1, then writes `psc`.
//! 3. **Generate**: every generator raises `spike` if a spike was due. Several spikes due
//!    in one tick raise a single flag.
//! 4. **Record**: the recorder receives `time` and every designated signal.
//!
//! Within a phase, elements run in registration order. No element reads a signal written by
//! another element in the same phase.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use ahash::AHashMap;
use tantrika_npu_neural::export::{save_series_csv, CsvExport};
use tantrika_npu_neural::{
    Named, Neuron, NeuronInput, PortDirection, Result, Signal, SignalId, SignalValue,
    SpikeGenerator, Synapse, TantrikaError,
};
use tracing::{debug, info, trace};

use crate::element::{ElementType, ExternalSignal, NetworkElement};
use crate::recorder::{Recorder, Snapshot, TimeSeriesRecorder};
use crate::registry::Registry;
use crate::report::RunReport;
use crate::scheduler::{Clock, Phase, Scheduler, Tick, TickHandler};
use crate::wiring::{self, Binding, PortAddress, Wiring};

/// Runtime-gated tracing config for the tick loop.
/// Enable with:
/// - TANTRIKA_TRACE_TICKS=1
struct TickTraceCfg {
    enabled: bool,
}

fn tick_trace_cfg() -> &'static TickTraceCfg {
    static CFG: OnceLock<TickTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("TANTRIKA_TRACE_TICKS")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        TickTraceCfg { enabled }
    })
}

/// Signals read and written by one member, indexed by port ordinal
#[derive(Debug, Clone)]
struct MemberWiring {
    /// Bound sources of each input port (empty for outputs)
    sources: Vec<Vec<SignalId>>,
    /// Own signal of each output port (`None` for inputs)
    outputs: Vec<Option<SignalId>>,
}

#[inline]
fn sum_real(signals: &[Signal], ids: &[SignalId]) -> f64 {
    ids.iter().map(|id| signals[id.0 as usize].read_real()).sum()
}

/// Sum of the values latched before phase 1
#[inline]
fn sum_latched(latched: &[f64], ids: &[SignalId]) -> f64 {
    ids.iter().map(|id| latched[id.0 as usize]).sum()
}

#[inline]
fn any_flag(signals: &[Signal], ids: &[SignalId]) -> bool {
    ids.iter().any(|id| signals[id.0 as usize].read_flag())
}

#[inline]
fn write(signals: &mut [Signal], id: Option<SignalId>, value: SignalValue) {
    if let Some(id) = id {
        signals[id.0 as usize].write(value);
    }
}

struct NetworkState<R> {
    registry: Registry,
    /// `[element][member]`
    wiring: Vec<Vec<MemberWiring>>,
    signals: Vec<Signal>,
    /// Real value of every signal at the end of the previous tick
    latched: Vec<f64>,
    outputs: AHashMap<PortAddress, SignalId>,
    bindings: Vec<Binding>,

    recorded: Vec<SignalId>,
    /// `time` followed by the recorded signal names
    record_names: Vec<String>,
    record_values: Vec<f64>,
    recorder: R,

    neuron_spikes: usize,
    generator_spikes: usize,
}

impl<R: Recorder> NetworkState<R> {
    fn integrate(&mut self, tick: Tick) {
        let trace_enabled = tick_trace_cfg().enabled;
        for (slot, signal) in self.latched.iter_mut().zip(&self.signals) {
            *slot = signal.read_real();
        }
        let signals = &mut self.signals;
        for (element, wiring) in self.registry.elements_mut().iter_mut().zip(&self.wiring) {
            for (neuron, member) in element.neurons_mut().iter_mut().zip(wiring) {
                let input = NeuronInput {
                    inject: sum_real(signals, &member.sources[Neuron::PORT_INJECT]),
                    synaptic: sum_real(signals, &member.sources[Neuron::PORT_PSC]),
                };
                let fired = neuron.decay(tick.time, input);
                write(signals, member.outputs[Neuron::PORT_VM], SignalValue::Real(neuron.vm()));
                write(signals, member.outputs[Neuron::PORT_SPIKE], SignalValue::Flag(fired));
                if fired {
                    self.neuron_spikes += 1;
                    if trace_enabled {
                        trace!(tick = tick.index, t = tick.time, neuron = %neuron.path(), "neuron spike");
                    }
                }
            }
        }
    }

    fn update_synapses(&mut self, tick: Tick) {
        let signals = &mut self.signals;
        let latched = &self.latched;
        for (element, wiring) in self.registry.elements_mut().iter_mut().zip(&self.wiring) {
            for (synapse, member) in element.synapses_mut().iter_mut().zip(wiring) {
                let spike = any_flag(signals, &member.sources[Synapse::PORT_SPIKE]);
                // Never the voltage phase 1 wrote this tick
                let vm_post = sum_latched(latched, &member.sources[Synapse::PORT_POST]);
                let current = synapse.update(tick.time, spike, vm_post);
                write(signals, member.outputs[Synapse::PORT_PSC], SignalValue::Real(current));
            }
        }
    }

    fn generate(&mut self, tick: Tick) {
        let trace_enabled = tick_trace_cfg().enabled;
        let signals = &mut self.signals;
        for (element, wiring) in self.registry.elements_mut().iter_mut().zip(&self.wiring) {
            for (generator, member) in element.generators_mut().iter_mut().zip(wiring) {
                let emitted = generator.advance_if_due(tick.time);
                write(
                    signals,
                    member.outputs[SpikeGenerator::PORT_SPIKE],
                    SignalValue::Flag(emitted > 0),
                );
                self.generator_spikes += emitted as usize;
                if emitted > 1 {
                    trace!(tick = tick.index, t = tick.time, generator = %generator.path(), emitted, "spikes coalesced into one flag");
                }
                if emitted > 0 && trace_enabled {
                    trace!(tick = tick.index, t = tick.time, generator = %generator.path(), emitted, "generator spike");
                }
            }
        }
    }

    fn record(&mut self, tick: Tick) {
        self.record_values.clear();
        self.record_values.push(tick.time);
        for id in &self.recorded {
            self.record_values.push(self.signals[id.0 as usize].read_real());
        }
        self.recorder.record(&Snapshot {
            tick: tick.index,
            time: tick.time,
            names: &self.record_names,
            values: &self.record_values,
        });
    }
}

impl<R: Recorder> TickHandler for NetworkState<R> {
    fn run_phase(&mut self, phase: Phase, tick: Tick) -> Result<()> {
        match phase {
            Phase::Integrate => self.integrate(tick),
            Phase::Synapse => self.update_synapses(tick),
            Phase::Generate => self.generate(tick),
            Phase::Record => self.record(tick),
        }
        Ok(())
    }
}

/// A wired network ready to simulate. Built by [`crate::Assembly::finalize`].
///
/// Elements and bindings are fixed; only external signals can be changed between runs.
pub struct RunnableNetwork<R: Recorder = TimeSeriesRecorder> {
    path: String,
    scheduler: Scheduler,
    csv_delimiter: char,
    state: NetworkState<R>,
}

impl<R: Recorder> RunnableNetwork<R> {
    pub(crate) fn new(
        path: String,
        clock: Clock,
        csv_delimiter: char,
        registry: Registry,
        wiring: Wiring,
        recorded: Vec<SignalId>,
        recorder: R,
    ) -> Self {
        let member_wiring = registry
            .iter()
            .map(|(id, element)| {
                let ports = element.ports();
                (0..element.size())
                    .map(|member| {
                        let mut sources = vec![Vec::new(); ports.len()];
                        let mut outputs = vec![None; ports.len()];
                        for (ordinal, spec) in ports.iter().enumerate() {
                            let address = PortAddress {
                                element: id,
                                member,
                                port: ordinal,
                            };
                            if spec.is_input() {
                                sources[ordinal] =
                                    wiring.bindings_for(address).map(|b| b.source).collect();
                            } else {
                                outputs[ordinal] = wiring.output_signal(address);
                            }
                        }
                        MemberWiring { sources, outputs }
                    })
                    .collect()
            })
            .collect();

        let (signals, outputs, bindings) = wiring.into_parts();
        let record_names = std::iter::once("time".to_string())
            .chain(
                recorded
                    .iter()
                    .map(|id| signals[id.0 as usize].name().to_string()),
            )
            .collect();

        Self {
            path,
            scheduler: Scheduler::new(clock),
            csv_delimiter,
            state: NetworkState {
                registry,
                wiring: member_wiring,
                latched: signals.iter().map(Signal::read_real).collect(),
                signals,
                outputs,
                bindings,
                record_values: Vec::with_capacity(recorded.len() + 1),
                recorded,
                record_names,
                recorder,
                neuron_spikes: 0,
                generator_spikes: 0,
            },
        }
    }

    /// Advance the simulation by `duration` simulated seconds.
    pub fn run(&mut self, duration: f64) -> Result<RunReport> {
        let started = Instant::now();
        self.state.neuron_spikes = 0;
        self.state.generator_spikes = 0;
        info!(network = %self.path, duration, dt = self.dt(), from = self.time(), "Starting simulation");

        let ticks = self.scheduler.advance(duration, &mut self.state)?;

        let report = RunReport {
            ticks,
            simulated_seconds: ticks as f64 * self.dt(),
            end_time: self.time(),
            spikes: self.state.neuron_spikes,
            generator_spikes: self.state.generator_spikes,
            wall_time_secs: started.elapsed().as_secs_f64(),
        };
        info!(network = %self.path, %report, "Simulation finished");
        Ok(report)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dt(&self) -> f64 {
        self.scheduler.clock().period()
    }

    /// Simulated time of the next tick
    pub fn time(&self) -> f64 {
        self.scheduler.clock().time()
    }

    /// Ticks executed so far
    pub fn tick_count(&self) -> u64 {
        self.scheduler.clock().tick()
    }

    /// Set the value of an external signal added with [`crate::Assembly::add_signal`].
    pub fn write_signal(&mut self, path: &str, value: SignalValue) -> Result<()> {
        let id = self.state.registry.lookup(path)?;
        let kind = match self.state.registry.get(id) {
            Some(NetworkElement::Signal(external)) => external.kind(),
            Some(other) => {
                return Err(TantrikaError::WrongElementType {
                    path: path.to_string(),
                    expected: ElementType::Signal.name(),
                    actual: other.element_type().name(),
                })
            }
            None => return Err(TantrikaError::UnknownPath(path.to_string())),
        };
        if !value.fits(kind) {
            return Err(TantrikaError::InvalidParameter {
                name: "value",
                value: value.as_f64(),
                reason: "value does not match the signal kind",
            });
        }
        let address = PortAddress {
            element: id,
            member: 0,
            port: ExternalSignal::PORT_OUT,
        };
        if let Some(signal) = self.state.outputs.get(&address) {
            self.state.signals[signal.0 as usize].write(value);
            debug!(signal = path, ?value, "External signal written");
        }
        Ok(())
    }

    /// Current value of an output port, e.g. `read_signal("exc[2]", "vm")`.
    pub fn read_signal(&self, endpoint: &str, port: &str) -> Result<SignalValue> {
        let registry = &self.state.registry;
        let (_, member) = wiring::resolve_member(registry, endpoint, "single member")?;
        let resolved = wiring::resolve_port(registry, endpoint, port, PortDirection::Output)?;
        match self.state.outputs.get(&resolved.address(member)) {
            Some(signal) => Ok(self.state.signals[signal.0 as usize].read()),
            None => Err(TantrikaError::UnknownPort {
                path: endpoint.to_string(),
                element_type: registry
                    .get(resolved.element)
                    .map(|e| e.element_type().name())
                    .unwrap_or("?"),
                port: port.to_string(),
            }),
        }
    }

    pub fn neuron(&self, endpoint: &str) -> Result<&Neuron> {
        wiring::member(&self.state.registry, endpoint, "Neuron", NetworkElement::neurons)
    }

    pub fn synapse(&self, endpoint: &str) -> Result<&Synapse> {
        wiring::member(&self.state.registry, endpoint, "Synapse", NetworkElement::synapses)
    }

    pub fn spike_generator(&self, endpoint: &str) -> Result<&SpikeGenerator> {
        wiring::member(
            &self.state.registry,
            endpoint,
            "SpikeGenerator",
            NetworkElement::generators,
        )
    }

    pub fn find_group(&self, path: &str) -> Result<&NetworkElement> {
        self.state.registry.find_group(path)
    }

    pub fn find_elements_by_type(&self, element_type: ElementType) -> Vec<&NetworkElement> {
        self.state.registry.find_elements_by_type(element_type)
    }

    pub fn describe(&self, path: &str) -> Result<String> {
        Ok(self.state.registry.find_group(path)?.describe())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.state.bindings
    }

    /// Recorder column names: `time` followed by the designated signals
    pub fn recorded_signals(&self) -> &[String] {
        &self.state.record_names
    }

    pub fn recorder(&self) -> &R {
        &self.state.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.state.recorder
    }

    pub fn into_recorder(self) -> R {
        self.state.recorder
    }

    /// Write one `(time, vm)` file per neuron into `dir`, named after the neuron path.
    pub fn save_neuron_traces(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| TantrikaError::io(dir, e))?;
        let mut written = Vec::new();
        for element in self.state.registry.elements() {
            for neuron in element.neurons() {
                let target = dir.join(format!("{}.csv", neuron.path()));
                neuron.save_data_to(&target)?;
                written.push(target);
            }
        }
        info!(dir = %dir.display(), files = written.len(), "Saved neuron traces");
        Ok(written)
    }
}

impl RunnableNetwork<TimeSeriesRecorder> {
    /// Write every recorded series to `<dir>/<network path>.csv`.
    pub fn save_data(&self, dir: impl AsRef<Path>) -> Result<(PathBuf, CsvExport)> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| TantrikaError::io(dir, e))?;
        let target = dir.join(format!("{}.csv", self.path));
        let report = save_series_csv(&target, &self.state.recorder.series(), self.csv_delimiter)?;
        info!(
            file = %target.display(),
            rows = report.rows,
            columns = report.columns,
            truncated = report.truncated,
            "Saved network data"
        );
        Ok((target, report))
    }
}
