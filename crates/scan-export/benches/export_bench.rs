//! 내보내기 벤치마크
//!
//! 아티팩트 배치 분할, 페이지 CSV 인코딩, 파일 다이제스트 계산 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use scandata_export::digest::sha256_file;
use scandata_export::writer::encode_rows;
use scandata_export::{ArtifactId, ScanDataRow, partition};

fn sample_row(i: usize) -> ScanDataRow {
    ScanDataRow {
        scanner: "Trivy".to_owned(),
        repository: format!("library/app{}", i % 50),
        artifact_digest: format!("sha256:{i:064x}"),
        cve_id: format!("CVE-2024-{i:05}"),
        package: "openssl".to_owned(),
        version: "1.1.1".to_owned(),
        fixed_version: "1.1.1w".to_owned(),
        severity: "High".to_owned(),
        cwe_ids: "CWE-79,CWE-89".to_owned(),
        cvss_score_v3: Some(7.5),
        cvss_score_v2: Some(5.0),
        cvss_vector_v3: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N".to_owned(),
        cvss_vector_v2: "AV:N/AC:L/Au:N/C:P/I:N/A:N".to_owned(),
        additional_data: "{\"source\": \"nvd\"}".to_owned(),
    }
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");

    for size in &[1_000usize, 10_000, 100_000] {
        let ids: Vec<ArtifactId> = (0..*size as i64).map(ArtifactId).collect();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| partition(black_box(&ids), 10_000))
        });
    }

    group.finish();
}

fn bench_encode_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_page");

    for size in &[100usize, 1_000, 10_000] {
        let rows: Vec<ScanDataRow> = (0..*size).map(sample_row).collect();
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| encode_rows(black_box(&rows), true).unwrap())
        });
    }

    group.finish();
}

fn bench_file_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_digest");
    let dir = tempfile::tempdir().unwrap();

    for size in &[1_000usize, 10_000] {
        let rows: Vec<ScanDataRow> = (0..*size).map(sample_row).collect();
        let bytes = encode_rows(&rows, true).unwrap();
        let path = dir.path().join(format!("bench_{size}.csv"));
        std::fs::write(&path, &bytes).unwrap();

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| sha256_file(black_box(&path)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_partition,
    bench_encode_page,
    bench_file_digest
);
criterion_main!(benches);
