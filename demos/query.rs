use dnsclient::dns_parser::Type;
use dnsclient::{Resolver, ResolverOptions};

pub fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("dnsclient=debug");
    builder.init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "example.com".to_owned());
    let qtype = args
        .next()
        .and_then(|t| Type::from_mnemonic(&t))
        .unwrap_or(Type::A);

    let resolver = Resolver::system(ResolverOptions::default()).unwrap();
    let answer = resolver.resolve_blocking(&name, qtype).unwrap();

    println!(
        ";; {} from {:?}, {} bytes",
        answer.response_code,
        answer.server(),
        answer.size
    );
    for record in answer.records() {
        println!(
            "{}\t{}\t{}\t{}\t{:?}",
            record.name(),
            record.ttl(),
            record.class(),
            record.rtype(),
            record.data
        );
    }
}
