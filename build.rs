fn main() {
    // ESP-IDF link arguments are only needed for the on-target build;
    // host builds (tests, simulation) skip the IDF environment entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
