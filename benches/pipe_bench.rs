//! Benchmarks for bytepipe.
//!
//! Run with:
//!     cargo bench

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use bytepipe::{FrameReader, LineDecoder, PipeConfig, pipe, pipe_with};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn bench_transfer(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("transfer");

    // Total bytes moved through the pipe, in batches of one segment.
    for size in [64 * 1024, 1024 * 1024, 10 * 1024 * 1024] {
        let batch = 16 * 1024;
        let data: Vec<u8> = (0..batch).map(|i| (i * 7 + 13) as u8).collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            format!("write_read_{}kb", size / 1024),
            &data,
            |b, data| {
                b.iter(|| {
                    rt.block_on(async {
                        let (mut writer, mut reader) = pipe();
                        let mut moved = 0usize;
                        while moved < size {
                            let buf = writer.get_buffer(data.len()).unwrap();
                            buf[..data.len()].copy_from_slice(black_box(data));
                            writer.advance(data.len()).unwrap();
                            writer.flush().await.unwrap();

                            let result = reader.read().await.unwrap();
                            let buf = result.into_buffer();
                            moved += buf.len();
                            let end = buf.end();
                            reader.advance_to(buf, end, end).unwrap();
                        }
                        black_box(moved)
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_thresholds(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("thresholds");
    let size = 1024 * 1024; // 1 MB
    let batch = 4 * 1024;
    let data: Vec<u8> = (0..batch).map(|i| (i * 7 + 13) as u8).collect();

    // Pause thresholds small enough that flow control actually engages.
    for (name, pause, resume) in [
        ("tight", 8 * 1024, 4 * 1024),
        ("default", 64 * 1024, 32 * 1024),
        ("loose", 1024 * 1024, 512 * 1024),
    ] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(async {
                    let config = PipeConfig::new(pause, resume).unwrap();
                    let (mut writer, mut reader) = pipe_with(config).unwrap();

                    let producer = async {
                        for _ in 0..(size / batch) {
                            let buf = writer.get_buffer(data.len()).unwrap();
                            buf[..data.len()].copy_from_slice(black_box(&data));
                            writer.advance(data.len()).unwrap();
                            writer.flush().await.unwrap();
                        }
                        writer.complete();
                    };
                    let consumer = async {
                        let mut moved = 0usize;
                        loop {
                            let result = reader.read().await.unwrap();
                            let completed = result.is_completed();
                            let buf = result.into_buffer();
                            moved += buf.len();
                            let end = buf.end();
                            reader.advance_to(buf, end, end).unwrap();
                            if completed {
                                break;
                            }
                        }
                        moved
                    };

                    let ((), moved) = tokio::join!(producer, consumer);
                    black_box(moved)
                })
            });
        });
    }

    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("framing");
    let line_count = 10_000usize;
    let line = b"a benchmark line of reasonable length\n";
    let size = line_count * line.len();

    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (mut writer, reader) = pipe();

                let producer = async {
                    for _ in 0..line_count {
                        let buf = writer.get_buffer(line.len()).unwrap();
                        buf[..line.len()].copy_from_slice(black_box(line));
                        writer.advance(line.len()).unwrap();
                        writer.flush().await.unwrap();
                    }
                    writer.complete();
                };
                let consumer = async {
                    let mut frames = FrameReader::new(reader, LineDecoder::new());
                    let mut count = 0usize;
                    while frames.next_frame().await.unwrap().is_some() {
                        count += 1;
                    }
                    count
                };

                let ((), count) = tokio::join!(producer, consumer);
                black_box(count)
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_transfer, bench_thresholds, bench_framing);
criterion_main!(benches);
