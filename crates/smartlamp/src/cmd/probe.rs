use crate::cmd::{Context, ProbeArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_probe, OutputFormat, ProbeReport};

pub fn run(_args: ProbeArgs, ctx: &Context, format: OutputFormat) -> CliResult<i32> {
    let (host, _surface) = ctx.attach()?;
    let session = host
        .session()
        .ok_or_else(|| CliError::new(INTERNAL, "session missing after attach"))?;

    let endpoints = session.endpoints();
    let report = ProbeReport {
        device: ctx.device()?.to_string(),
        session_id: session.id().to_string(),
        transport: session.transport_name(),
        in_endpoint: format!("{:#04x}", endpoints.in_address),
        out_endpoint: format!("{:#04x}", endpoints.out_address),
        mtu: endpoints.mtu,
        frame_limit: session.config().frame_limit(endpoints.mtu),
        priming_reading: session.priming_reading(),
    };
    host.on_detach();

    print_probe(&report, format);
    Ok(SUCCESS)
}
