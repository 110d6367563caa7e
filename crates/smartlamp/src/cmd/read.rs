use tracing::warn;

use crate::cmd::{Context, ReadArgs};
use crate::exit::{attr_error, CliResult, SUCCESS};
use crate::output::{print_reading, AttributeReading, OutputFormat};

pub fn run(args: ReadArgs, ctx: &Context, format: OutputFormat) -> CliResult<i32> {
    let (host, surface) = ctx.attach()?;
    let device = ctx.device()?.to_string();

    let (text, sentinel) = if args.strict {
        let value = surface
            .registry()
            .read(&args.attribute)
            .map_err(|err| attr_error("read failed", err))?;
        (value.render(), false)
    } else {
        let before = surface.collapsed_reads();
        let text = surface
            .show(&args.attribute)
            .map_err(|err| attr_error("read failed", err))?;
        let sentinel = surface.collapsed_reads() > before;
        if sentinel {
            if let Some(reason) = surface.last_failure() {
                warn!(attribute = %args.attribute, %reason, "device did not answer");
            }
        }
        (text, sentinel)
    };
    host.on_detach();

    print_reading(
        &AttributeReading {
            device,
            attribute: args.attribute,
            text,
            sentinel,
        },
        format,
    );
    Ok(SUCCESS)
}
