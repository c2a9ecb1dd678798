// demos/gendy_wav.rs
use sonide::gendy::{Distribution, Gendy, GendyParams};
use sonide::{Opcode, PerfContext};

fn main() {
    tracing_subscriber::fmt().init();

    let ctx = PerfContext::new(44100.0, 512);
    let mut gendy = Gendy::new(GendyParams {
        amp: 0.8,
        amp_dist: Distribution::Cauchy,
        dur_dist: Distribution::Linear,
        min_freq: 110.0,
        max_freq: 440.0,
        init_cps: 24,
        knum: 24,
        seed: Some(20120),
        ..GendyParams::default()
    });
    gendy.init(&ctx).unwrap();

    // Generate 3 seconds of audio
    let mut samples = Vec::with_capacity(44100 * 3);
    let mut block = vec![0.0; 512];
    while samples.len() < 44100 * 3 {
        gendy.process_block(&ctx, &mut block).unwrap();
        samples.extend_from_slice(&block);
    }

    // Save to WAV
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create("gendy.wav", spec).unwrap();
    for &sample in &samples {
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();

    println!("Generated gendy.wav - a dynamic stochastic waveform");
}
