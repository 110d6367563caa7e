use crate::cmd::{Context, WriteArgs};
use crate::exit::{attr_error, CliResult, SUCCESS};
use crate::output::{print_write, AttributeWrite, OutputFormat};

pub fn run(args: WriteArgs, ctx: &Context, format: OutputFormat) -> CliResult<i32> {
    let (host, surface) = ctx.attach()?;
    let device = ctx.device()?.to_string();

    let bytes = surface
        .store(&args.attribute, &args.value)
        .map_err(|err| attr_error("write failed", err))?;
    host.on_detach();

    print_write(
        &AttributeWrite {
            device,
            attribute: args.attribute,
            value: args.value,
            bytes,
        },
        format,
    );
    Ok(SUCCESS)
}
