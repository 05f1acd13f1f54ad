use serde_json::json;
use vlist_data::{PlaceholderOptions, PlaceholderSynthesizer};

fn main() {
    // Example: skeleton rows shaped like the real data.
    let sample = [
        json!({ "id": 1, "name": "Ada Lovelace", "email": "ada@example.com", "admin": true }),
        json!({ "id": 2, "name": "Alan Turing", "email": "alan@example.com", "admin": false }),
        json!({ "id": 3, "name": "Grace Hopper", "email": "grace@example.com", "admin": false }),
    ];

    let mut synth = PlaceholderSynthesizer::new(PlaceholderOptions::default(), "id");
    synth.analyze(&sample);
    for field in synth.fields() {
        println!("{field:?}");
    }
    for index in 0..4 {
        println!("{index}: {}", synth.generate(index));
    }

    // Swapping real rows in keeps anything that is already real.
    let mut rows = vec![Some(synth.generate(0)), Some(sample[1].clone()), None];
    let replaced = PlaceholderSynthesizer::replace(&mut rows, &sample, 0);
    println!("replaced {replaced} placeholders: {rows:?}");
}
