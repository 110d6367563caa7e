use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("smartlamp {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: smartlamp");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SMARTLAMP_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: serial={}, raw-sensor-text={}, cli=true",
        cfg!(feature = "serial"),
        cfg!(feature = "raw-sensor-text")
    );
    println!(
        "usb_bridge: cp2102 (vid {:#06x}, pid {:#06x})",
        smartlamp::CP2102_VENDOR_ID,
        smartlamp::CP2102_PRODUCT_ID
    );

    Ok(SUCCESS)
}
