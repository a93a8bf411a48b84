use sweepbridge::{
    Channel, ConvertError, Converter, ExportOptions, FileType, MemoryBackend, NoProgress,
    Recording, Section,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// 创建测试录音：每个通道给出 (样本, 采样间隔) 列表
fn create_recording(x_scale: f64, channels: &[(&str, &str, Vec<(Vec<f64>, f64)>)]) -> Recording {
    let mut recording = Recording::new();
    recording.set_x_scale(x_scale);
    recording.set_x_units("ms");
    recording.set_comment("export test");
    recording.set_date("2024-03-15");
    recording.set_time("14:30:05");

    for (name, units, sections) in channels {
        let mut channel = Channel::new(name, units);
        for (samples, interval) in sections {
            channel.push_section(Section::from_samples(samples.clone(), *interval));
        }
        recording.push_channel(channel);
    }
    recording
}

#[test]
fn test_equal_rates_one_to_one() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        0.5,
        &[
            ("Vm", "mV", vec![(vec![1.0, 2.0, 3.0, 4.0], 0.5)]),
            ("Im", "pA", vec![(vec![5.0, 6.0, 7.0, 8.0], 0.5)]),
        ],
    );

    Converter::new(backend.clone())
        .export("out.gdf", &recording, &mut NoProgress)
        .unwrap();

    let file = backend.get("out.gdf").unwrap();
    assert_eq!(file.samples_per_record(), Some(1));
    let raw = file.raw().unwrap();
    assert_eq!(raw.records(), 4);
    assert_eq!(raw.bytes_per_record(), 16);
    // 第二个记录：Vm 在前，Im 在后
    assert_eq!(raw.read_f64(16), Some(2.0));
    assert_eq!(raw.read_f64(24), Some(6.0));
    assert!(file.events().is_empty());
}

#[test]
fn test_slow_channel_is_repeated() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        0.1,
        &[
            ("Vm", "mV", vec![(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 0.1)]),
            ("Im", "pA", vec![(vec![10.0, 20.0], 0.3)]),
        ],
    );

    let converter = Converter::new(backend.clone());
    converter
        .export("mixed.gdf", &recording, &mut NoProgress)
        .unwrap();

    let file = backend.get("mixed.gdf").unwrap();
    assert_eq!(file.samples_per_record(), Some(3));
    assert_eq!(file.info().samples_per_channel, 6);
    assert_eq!(file.raw().unwrap().records(), 2);

    let imported = converter.import("mixed.gdf", &mut NoProgress).unwrap();
    assert_eq!(imported[0][0].samples(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(imported[1][0].samples(), &[10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
}

#[test]
fn test_record_count_and_padding() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        1.0,
        &[
            ("A", "mV", vec![(vec![1.0, 2.0], 1.0), (vec![3.0], 2.0)]),
            ("B", "mV", vec![(vec![4.0, 5.0], 1.0), (vec![6.0, 7.0], 1.0)]),
        ],
    );

    Converter::new(backend.clone())
        .export("padded.gdf", &recording, &mut NoProgress)
        .unwrap();

    // 每个记录 2 个时钟，共 4 个时钟 -> 2 个记录
    let file = backend.get("padded.gdf").unwrap();
    assert_eq!(file.samples_per_record(), Some(2));
    assert_eq!(file.raw().unwrap().records(), 2);

    // 共 5 个时钟 -> 3 个记录，最后一个时钟用填充值
    let odd = create_recording(
        1.0,
        &[("A", "mV", vec![(vec![1.0, 2.0, 3.0], 1.0), (vec![4.0], 2.0)])],
    );
    let backend = MemoryBackend::new();
    let converter = Converter::new(backend.clone())
        .with_export_options(ExportOptions::default().with_pad_value(-1.0));
    converter.export("odd.gdf", &odd, &mut NoProgress).unwrap();

    let file = backend.get("odd.gdf").unwrap();
    let raw = file.raw().unwrap();
    assert_eq!(file.samples_per_record(), Some(2));
    assert_eq!(raw.records(), 3);
    assert_eq!(raw.read_f64(32), Some(4.0));
    assert_eq!(raw.read_f64(40), Some(-1.0));

    // 读取时去掉填充
    let imported = converter.import("odd.gdf", &mut NoProgress).unwrap();
    assert_eq!(imported[0][1].samples(), &[4.0, 4.0]);
}

#[test]
fn test_section_markers() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        0.1,
        &[(
            "Vm",
            "mV",
            vec![
                (vec![0.0; 4], 0.1),
                (vec![0.0; 2], 0.2),
                (vec![0.0; 3], 0.1),
            ],
        )],
    );

    Converter::new(backend.clone())
        .export("marked.gdf", &recording, &mut NoProgress)
        .unwrap();

    let file = backend.get("marked.gdf").unwrap();
    let breaks: Vec<usize> = file.events().segment_breaks().collect();
    assert_eq!(breaks, vec![4, 8]);
    assert!((file.events().sample_rate() - 10_000.0).abs() < 1e-6);
    assert!((file.info().sample_rate - 10_000.0).abs() < 1e-6);
}

#[test]
fn test_header_fields() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(1.0, &[("Vm", "mV", vec![(vec![0.0; 3], 1.0)])]);

    Converter::new(backend.clone())
        .with_export_options(ExportOptions::default().with_file_type(FileType::Edf))
        .export("header.edf", &recording, &mut NoProgress)
        .unwrap();

    let file = backend.get("header.edf").unwrap();
    assert_eq!(file.info().file_type, FileType::Edf);
    assert_eq!(file.info().recording_id, "export test");
    assert_eq!(
        file.info().start.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-03-15 14:30:05"
    );
    assert_eq!(file.channels()[0].label, "Vm");
    assert_eq!(file.channels()[0].phys_dim, "mV");
    assert_eq!(file.channels()[0].phys_dim_code, 4274);
}

#[test]
fn test_unparsable_date_uses_default_start() {
    init_logging();
    let backend = MemoryBackend::new();
    let mut recording = create_recording(1.0, &[("Vm", "mV", vec![(vec![0.0; 3], 1.0)])]);
    recording.set_date("yesterday");

    Converter::new(backend.clone())
        .export("nodate.gdf", &recording, &mut NoProgress)
        .unwrap();
    let file = backend.get("nodate.gdf").unwrap();
    assert_eq!(
        file.info().start.format("%Y-%m-%d %H:%M:%S").to_string(),
        "1985-01-01 00:00:00"
    );
}

#[test]
fn test_section_count_mismatch_writes_nothing() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        1.0,
        &[
            ("A", "mV", vec![(vec![0.0; 3], 1.0), (vec![0.0; 3], 1.0)]),
            (
                "B",
                "mV",
                vec![(vec![0.0; 2], 1.0), (vec![0.0; 2], 1.0), (vec![0.0; 2], 1.0)],
            ),
        ],
    );

    let result = Converter::new(backend.clone()).export("bad.gdf", &recording, &mut NoProgress);
    assert!(matches!(result, Err(ConvertError::ExportSizeMismatch(_))));
    assert!(!backend.contains("bad.gdf"));
}

#[test]
fn test_length_mismatch() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        1.0,
        &[
            ("A", "mV", vec![(vec![0.0; 3], 1.0)]),
            ("B", "mV", vec![(vec![0.0; 4], 1.0)]),
        ],
    );

    let result = Converter::new(backend.clone()).export("bad.gdf", &recording, &mut NoProgress);
    assert!(matches!(result, Err(ConvertError::ExportSizeMismatch(_))));
    assert!(backend.is_empty());
}

#[test]
fn test_empty_recording() {
    init_logging();
    let backend = MemoryBackend::new();
    let result =
        Converter::new(backend.clone()).export("empty.gdf", &Recording::new(), &mut NoProgress);
    match result {
        Err(e @ ConvertError::ExportSizeMismatch(_)) => {
            assert!(e.to_string().starts_with("File can't be exported"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!backend.contains("empty.gdf"));
}

#[test]
fn test_fractional_interval_is_rejected() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(1.0, &[("A", "mV", vec![(vec![0.0; 4], 0.4)])]);

    let result = Converter::new(backend.clone()).export("bad.gdf", &recording, &mut NoProgress);
    assert!(matches!(
        result,
        Err(ConvertError::InvalidSamplingInterval { channel: 0, section: 0, .. })
    ));
    assert!(!backend.contains("bad.gdf"));
}

#[test]
fn test_huge_record_is_rejected_before_writing() {
    init_logging();
    let backend = MemoryBackend::new();
    // 两段间隔的 LCM 放大后超出地址空间
    let recording = create_recording(
        1.0,
        &[(
            "A",
            "mV",
            vec![(vec![0.0], 4_294_967_291.0), (vec![0.0], 4_294_967_279.0)],
        )],
    );

    let result = Converter::new(backend.clone()).export("huge.gdf", &recording, &mut NoProgress);
    assert!(matches!(result, Err(ConvertError::ExportTooLarge(_))));
    assert!(!backend.contains("huge.gdf"));
}

#[test]
fn test_read_only_backend() {
    init_logging();
    let backend = MemoryBackend::new().with_read_only(true);
    let recording = create_recording(1.0, &[("A", "mV", vec![(vec![0.0; 4], 1.0)])]);

    let result = Converter::new(backend.clone()).export("out.gdf", &recording, &mut NoProgress);
    assert!(matches!(result, Err(ConvertError::WriterFailure(_))));
    assert!(!backend.contains("out.gdf"));
}

#[test]
fn test_x_units() {
    init_logging();
    let mut recording = create_recording(0.002, &[("A", "mV", vec![(vec![0.0; 4], 0.002)])]);
    recording.set_x_units("s");

    let backend = MemoryBackend::new();
    Converter::new(backend.clone())
        .export("seconds.gdf", &recording, &mut NoProgress)
        .unwrap();
    assert!((backend.get("seconds.gdf").unwrap().info().sample_rate - 500.0).abs() < 1e-9);

    // 非时间单位按 ms 处理，严格模式下报错
    recording.set_x_units("mV");
    Converter::new(backend.clone())
        .export("coerced.gdf", &recording, &mut NoProgress)
        .unwrap();
    assert!((backend.get("coerced.gdf").unwrap().info().sample_rate - 500_000.0).abs() < 1e-3);

    let strict = Converter::new(backend.clone())
        .with_export_options(ExportOptions::default().with_strict_time_units(true));
    let result = strict.export("strict.gdf", &recording, &mut NoProgress);
    assert!(matches!(result, Err(ConvertError::InvalidTimeUnit(_))));
    assert!(!backend.contains("strict.gdf"));
}

#[test]
fn test_export_progress() {
    init_logging();
    let backend = MemoryBackend::new();
    let recording = create_recording(
        1.0,
        &[
            ("A", "mV", vec![(vec![0.0; 2], 1.0)]),
            ("B", "mV", vec![(vec![0.0; 2], 1.0)]),
        ],
    );

    let mut updates = Vec::new();
    Converter::new(backend)
        .export("progress.gdf", &recording, &mut |p: u8, m: &str| {
            updates.push((p, m.to_string()))
        })
        .unwrap();

    assert_eq!(
        updates,
        vec![
            (50, "Writing channel #1 of 2".to_string()),
            (100, "Writing channel #2 of 2".to_string()),
        ]
    );
}
