use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rickdex_core::filter::{FilterOptions, Predicate, apply};
use rickdex_core::model::{Gender, Place, Record, RecordId, Status};
use rickdex_core::sort::{SortDirection, SortField, SortKey, sort_records};

const SIZES: [u32; 3] = [100, 826, 10_000];

fn catalog(size: u32) -> Vec<Record> {
    (1..=size)
        .map(|id| Record {
            id: RecordId(id),
            name: format!("Character {id}"),
            status: match id % 3 {
                0 => Status::Dead,
                1 => Status::Alive,
                _ => Status::Unknown,
            },
            species: ["Human", "Alien", "Robot", "Cronenberg"][(id % 4) as usize].to_string(),
            subtype: String::new(),
            gender: Gender::Unknown,
            origin: Place::default(),
            last_known_location: Place {
                name: format!("Dimension {}", id % 37),
                reference: String::new(),
            },
            image_ref: String::new(),
            episode_refs: Vec::new(),
            url: String::new(),
            created_at: format!("2017-11-{:02}T18:48:46.250Z", id % 28 + 1),
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter.apply");
    let predicate = Predicate::all()
        .with_text("character 1")
        .with_status(Status::Alive)
        .with_species("Human");

    for size in SIZES {
        let records = catalog(size);
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("combined", size), &records, |b, records| {
            b.iter(|| black_box(apply(records, &predicate)));
        });
        group.bench_with_input(BenchmarkId::new("options", size), &records, |b, records| {
            b.iter(|| black_box(FilterOptions::from_records(records)));
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort.records");
    for size in SIZES {
        let records = catalog(size);
        group.throughput(Throughput::Elements(u64::from(size)));
        for field in [SortField::Name, SortField::Created] {
            let key = SortKey {
                field,
                direction: SortDirection::Desc,
            };
            group.bench_with_input(
                BenchmarkId::new(field.to_string(), size),
                &records,
                |b, records| {
                    b.iter_batched(
                        || records.clone(),
                        |mut records| {
                            sort_records(&mut records, key);
                            records
                        },
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_filter, bench_sort);
criterion_main!(benches);
