use vault_crypto::{decrypt, encrypt, hash_password};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt(divan::black_box(&data), divan::black_box("bench-password")).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let data = make_data(size);
    let blob = encrypt(&data, "bench-password").unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| decrypt(divan::black_box(&blob), divan::black_box("bench-password")).unwrap());
}

#[divan::bench]
fn bench_hash_password() -> String {
    hash_password(
        divan::black_box("correct horse battery staple"),
        divan::black_box("00112233445566778899aabbccddeeff"),
    )
}

fn main() {
    divan::main();
}
