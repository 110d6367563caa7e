use smartlamp_attr::lamp_descriptors;

use crate::cmd::{Context, ListArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_attributes, AttributeRow, OutputFormat};

/// Lists the attribute table. Needs no device.
pub fn run(_args: ListArgs, ctx: &Context, format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<AttributeRow> = lamp_descriptors(ctx.registry.sensor_format)
        .iter()
        .map(|d| AttributeRow {
            name: d.name(),
            mode: format!("{:04o}", d.mode()),
            access: d.access().to_string(),
            value_type: d.value_type().as_str(),
            read_command: d.read_command_name().map(|c| c.as_str()),
            write_command: d.write_command_name().map(|c| c.as_str()),
        })
        .collect();

    print_attributes(&rows, format);
    Ok(SUCCESS)
}
