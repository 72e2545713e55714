use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use xml2json::{convert, from_xml_str};

const SIMPLE_XML: &str = "<root><child>text</child></root>";
const ATTR_XML: &str =
    "<root id=\"1\" name='test'><item value=\"42\" /><item value=\"43\" /></root>";

fn scan_report(hosts: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<nmaprun scanner=\"nmap\">\n");
    for i in 0..hosts {
        xml.push_str(&format!(
            "  <host><status state=\"up\"/><address addr=\"10.0.{}.{}\" addrtype=\"ipv4\"/>\
             <ports><port protocol=\"tcp\" portid=\"22\"><state state=\"open\"/>\
             <service name=\"ssh\"/></port></ports></host>\n",
            i / 256,
            i % 256
        ));
    }
    xml.push_str("</nmaprun>\n");
    xml
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("xml_parse_simple", |b| {
        b.iter(|| from_xml_str(black_box(SIMPLE_XML)))
    });
    c.bench_function("xml_parse_attr", |b| {
        b.iter(|| from_xml_str(black_box(ATTR_XML)))
    });
}

fn bench_convert(c: &mut Criterion) {
    let report = scan_report(1024);
    c.bench_function("convert_scan_report_1024_hosts", |b| {
        b.iter(|| convert(black_box(&report)))
    });
}

criterion_group!(benches, bench_parse, bench_convert);
criterion_main!(benches);
