use caption_forge::{GenerationError, GenerationRequest, ResponseResolver};

fn main() {
    let resolver = ResponseResolver::default();

    for attempt in 1..=4 {
        let request = GenerationRequest::text("weekend market haul", "food")
            .keywords("fresh produce, farmers market")
            .hashtag_count(6)
            .variety_seed("market-demo")
            .attempt(attempt);

        let result = resolver.resolve(Err(GenerationError::Timeout), &request);
        println!("Attempt {}:", attempt);
        println!("  {}", result.caption);
        println!("  {}", result.hashtag_line());
    }
}
