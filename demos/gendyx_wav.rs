// demos/gendyx_wav.rs
use sonide::gendy::{Distribution, GendyParams, Gendyx};
use sonide::{Opcode, PerfContext};

fn main() {
    tracing_subscriber::fmt().init();

    let ctx = PerfContext::new(44100.0, 512);
    let mut gendyx = Gendyx::new(
        GendyParams {
            amp: 0.8,
            amp_dist: Distribution::Arcsine,
            dur_dist: Distribution::Exponential,
            min_freq: 55.0,
            max_freq: 330.0,
            init_cps: 16,
            knum: 16,
            seed: Some(31415),
            ..GendyParams::default()
        },
        // Sharp rise, gentle fall.
        3.0,
        0.5,
    );
    gendyx.init(&ctx).unwrap();

    let mut samples = Vec::with_capacity(44100 * 3);
    let mut block = vec![0.0; 512];
    while samples.len() < 44100 * 3 {
        gendyx.process_block(&ctx, &mut block).unwrap();
        samples.extend_from_slice(&block);
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create("gendyx.wav", spec).unwrap();
    for &sample in &samples {
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();

    println!("Generated gendyx.wav - curved stochastic segments");
}
