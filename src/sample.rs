/// Ten short reviews used to pre-fill the input and by `reset_to_sample`.
pub const SAMPLE_REVIEWS: &str = "\
Review 1 (10/01): I absolutely love the new dashboard design! It's so intuitive and the colors are perfect. Great job team.
Review 2 (10/02): The load times are terrible. I waited 5 seconds for the report to generate. Unacceptable for a paid tier.
Review 3 (10/05): Customer support was helpful, but the billing process is confusing. Why are there so many hidden fees?
Review 4 (10/06): Best tool I've used for social media tracking. The automated reports save me hours every week.
Review 5 (10/07): App keeps crashing on mobile. Please fix this asap! I can't work on the go.
Review 6 (10/08): Solid update. I like the new export features. A bit pricey, but worth it for the stability.
Review 7 (10/10): I'm cancelling my subscription. Features promised in the roadmap are delayed by months.
Review 8 (10/12): Fantastic user experience. The onboarding tutorial was very clear.
Review 9 (10/15): Not bad, but lacks integration with Slack. Would be 5 stars if that was added.
Review 10 (10/16): The new AI features are mind-blowing! Deep thinking mode actually works.";
