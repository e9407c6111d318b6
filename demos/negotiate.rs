use std::env;

use v4l_negotiate::{Device, DeviceParameters, FourCC, Requirements};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/video0".to_string());
    let formats = match args.map(|s| s.parse::<FourCC>()).collect::<Result<Vec<_>, _>>() {
        Ok(formats) => formats,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let params = DeviceParameters::new(&path)
        .with_formats(formats)
        .with_size(640, 480)
        .with_fps(30)
        .with_verbose(1);

    let dev = match Device::open(params, Requirements::CAPTURE) {
        Ok(dev) => dev,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return;
        }
    };

    if dev.is_sink() {
        println!("{} is not a video node, opened it as a file", path);
        return;
    }

    if let Some(caps) = dev.capabilities() {
        println!("Bus         : {}", caps.bus_info());
        println!("Formats     : {}", caps.formats.len());
    }
    if let Some(input) = dev.input() {
        println!("Input       : {}", input.input);
    }
    if let Some(format) = dev.format() {
        println!("Format      : {}", format);
    }
    if let Some(params) = dev.stream_parameters() {
        println!("Interval    : {}", params.interval);
    }
}
