//! Synthetic identities for provisioned test users.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Prefix of every generated test user id.
pub const TEST_USER_ID_PREFIX: &str = "testuser";

const SURNAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Miller", "Davis", "Garcia", "Rodriguez",
    "Wilson", "Martinez", "Anderson", "Taylor", "Thomas", "Hernandez", "Moore", "Martin",
    "Jackson", "Thompson", "White", "Lopez", "Lee", "Gonzalez", "Harris", "Clark", "Lewis",
    "Robinson", "Walker", "Perez", "Hall", "Young", "Allen", "Sanchez", "Wright", "King",
    "Scott", "Green", "Baker", "Adams", "Nelson", "Hill", "Ramirez", "Campbell", "Mitchell",
    "Roberts", "Carter", "Phillips", "Evans", "Turner", "Torres", "Parker", "Collins",
    "Edwards", "Stewart", "Flores", "Morris", "Nguyen", "Murphy", "Rivera", "Cook", "Rogers",
    "Morgan", "Peterson", "Cooper", "Reed", "Bailey", "Bell", "Gomez", "Kelly", "Howard",
    "Ward", "Cox", "Diaz", "Richardson", "Wood", "Watson", "Brooks", "Bennett", "Gray",
    "James", "Reyes", "Cruz", "Hughes", "Price", "Myers", "Long", "Foster", "Sanders", "Ross",
    "Morales", "Powell", "Sullivan", "Russell", "Ortiz", "Jenkins", "Gutierrez", "Perry",
    "Butler", "Barnes", "Fisher", "Henderson", "Coleman", "Simmons", "Patterson", "Jordan",
    "Reynolds", "Hamilton", "Graham", "Kim", "Gonzales", "Alexander", "Ramos", "Wallace",
    "Griffin", "West", "Cole", "Hayes", "Chavez", "Gibson", "Bryant", "Ellis", "Stevens",
];

const MALE_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Charles", "Joseph",
    "Thomas", "Christopher", "Daniel", "Paul", "Mark", "Donald", "George", "Kenneth", "Steven",
    "Edward", "Brian", "Ronald", "Anthony", "Kevin", "Jason", "Matthew", "Gary", "Timothy",
    "Jose", "Larry", "Jeffrey", "Frank", "Scott", "Eric", "Stephen", "Andrew", "Raymond",
    "Gregory", "Joshua", "Jerry", "Dennis", "Walter", "Patrick", "Peter", "Harold", "Douglas",
    "Henry", "Carl", "Arthur", "Ryan", "Roger",
];

const FEMALE_NAMES: &[&str] = &[
    "Mary", "Patricia", "Linda", "Barbara", "Elizabeth", "Jennifer", "Maria", "Susan",
    "Margaret", "Dorothy", "Lisa", "Nancy", "Karen", "Betty", "Helen", "Sandra", "Donna",
    "Carol", "Ruth", "Sharon", "Michelle", "Laura", "Sarah", "Kimberly", "Deborah", "Jessica",
    "Shirley", "Cynthia", "Angela", "Melissa", "Brenda", "Amy", "Anna", "Rebecca", "Virginia",
    "Kathleen", "Pamela", "Martha", "Debra", "Amanda", "Stephanie", "Carolyn", "Christine",
    "Marie", "Janet", "Catherine", "Frances", "Ann", "Joyce", "Diane",
];

/// A generated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticUser {
    /// `testuser<hex>`.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// `"<first> <last>"`.
    pub name: String,
    /// First initial + family name, lowercased, at the configured domain.
    pub email: String,
}

/// Random name/id source for test users.
#[derive(Debug)]
pub struct IdentityGenerator {
    rng: StdRng,
    email_domain: String,
}

impl IdentityGenerator {
    /// Creates a generator. A seed makes the sequence reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>, email_domain: &str) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            email_domain: email_domain.to_string(),
        }
    }

    /// Generates an identity whose id is not rejected by `taken`.
    pub fn generate(&mut self, taken: impl Fn(&str) -> bool) -> SyntheticUser {
        let id = loop {
            let candidate = format!("{TEST_USER_ID_PREFIX}{:x}", self.rng.gen::<u32>());
            if !taken(&candidate) {
                break candidate;
            }
        };

        let first_names = if self.rng.gen_bool(0.5) {
            MALE_NAMES
        } else {
            FEMALE_NAMES
        };
        let first = first_names.choose(&mut self.rng).copied().unwrap_or("Test");
        let last = SURNAMES.choose(&mut self.rng).copied().unwrap_or("User");

        SyntheticUser {
            email: email_for(first, last, &self.email_domain),
            name: format!("{first} {last}"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            id,
        }
    }
}

fn email_for(first: &str, last: &str, domain: &str) -> String {
    let initial: String = first.chars().take(1).collect::<String>().to_lowercase();
    format!("{initial}{}@{domain}", last.to_lowercase())
}
