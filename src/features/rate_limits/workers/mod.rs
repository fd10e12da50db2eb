mod counter_purger;

pub use counter_purger::CounterPurger;
