// demos/dump_header.rs
//! Print the structural header of a Blackrock recording.
//!
//! Usage: cargo run --example dump_header -- /path/to/recording

use blackrock_rs::BlackrockReader;

fn main() -> blackrock_rs::Result<()> {
    let path = std::env::args()
        .nth(1)
        .expect("usage: dump_header <recording base path>");

    let mut reader = BlackrockReader::open(&path)?;
    reader.parse_header()?;
    let header = reader.header()?;

    println!("recording: {}", reader.base_path().display());
    println!("time base: {:?}", header.time_base);
    let origin = header.time_origin;
    println!(
        "acquired:  {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        origin.year, origin.month, origin.day, origin.hour, origin.minute, origin.second
    );

    println!("\nsignal streams:");
    for (i, stream) in header.signal_streams.iter().enumerate() {
        println!(
            "  [{i}] {} ({}): {} channels at {} Hz",
            stream.id,
            stream.label,
            stream.channel_count(),
            stream.sampling_rate
        );
    }

    println!("\nsegments:");
    for (b, block) in header.blocks.iter().enumerate() {
        for (s, segment) in block.segments.iter().enumerate() {
            println!(
                "  block {b} segment {s}: {:.6} s .. {:.6} s ({:.3} s)",
                segment.t_start,
                segment.t_stop,
                segment.duration()
            );
        }
    }

    println!("\nspike channels: {}", header.spike_channels.len());
    for channel in &header.spike_channels {
        println!(
            "  {}: {} spikes, {} waveform samples",
            channel.name,
            channel.spike_count(),
            channel.waveform_len
        );
    }

    println!("\nevent channels:");
    for channel in &header.event_channels {
        println!("  {}: {} events", channel.name, channel.event_count());
    }

    Ok(())
}
