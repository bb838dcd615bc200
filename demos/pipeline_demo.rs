use dataflow_sim::library::{constant, null, pipe};
use dataflow_sim::{connect, Agent, EngineError, Module, Scheduler, SchedulerConfig, VirtualTimeSyncScheduler};
use log::info;

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let source = constant();
    source.make_out_port::<Vec<f32>>("signal");
    source.set_state("signal", vec![0.5f32, 1.0, 1.5]);

    // A relay nested two modules deep, exposed through aliased ports
    let relay = pipe([("in", "out")]);
    relay.make_in_port::<Vec<f32>>("in");
    relay.make_out_port::<Vec<f32>>("out");
    let inner = Module::new();
    inner.add_component("relay", relay.clone());
    inner.alias_in_port(&relay, "in", "in")?;
    inner.alias_out_port(&relay, "out", "out")?;
    let outer = Module::new();
    outer.add_submodule("inner", inner.clone())?;
    outer.alias_in_port(&inner, "in", "in")?;
    outer.alias_out_port(&inner, "out", "out")?;

    let sink = null();
    sink.make_in_port::<Vec<f32>>("in");

    connect(&source, "signal", &outer, "in")?;
    connect(&outer, "out", &sink, "in")?;

    let agent = Agent::new();
    agent.add_component("source", source);
    agent.add_component("sink", sink.clone());
    agent.add_submodule("outer", outer)?;

    let config = SchedulerConfig::new().with_thread_pool_size(4);
    let mut scheduler = VirtualTimeSyncScheduler::with_config(agent, 1.0, &config)?;
    info!("scheduling {} components", scheduler.components().len());

    for _ in 0..4 {
        let time = scheduler.step()?;
        let seen = sink.get_input("in")?.cloned::<Vec<f32>>()?;
        info!("t = {}: sink sees {:?}", time, seen);
    }
    Ok(())
}
