//! # Indbygget Dansk Startkorpus
//!
//! Bruges til at så `data/intents.json` ved allerførste start, så
//! klassifikatoren har noget at træne på før brugeren har bekræftet en
//! eneste afklaring. Elleve intents med ~30 danske ytringer hver.
//!
//! Bemærk at "hej hej" optræder under både `greeting` og `goodbye` —
//! korpusset dedupleres bevidst ikke på tværs af intents.

use crate::corpus::IntentGroup;

/// Bygger startkorpusset som intent-grupper klar til [`crate::corpus::TrainingCorpus::seed`].
pub fn seed_groups() -> Vec<IntentGroup> {
    fn group(tag: &str, patterns: &[&str], responses: &[&str]) -> IntentGroup {
        IntentGroup {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            responses: responses.iter().map(|s| s.to_string()).collect(),
        }
    }

    vec![
        group(
            "get_time",
            &[
                "hvad er klokken",
                "kan du fortælle mig hvad klokken er",
                "hvad er tidspunktet",
                "fortæl mig tiden",
                "klokken",
                "tid",
                "hvad er den nu",
                "har du et ur",
                "ved du hvad klokken er",
                "hvor meget er klokken",
                "hvad siger klokken",
                "hvilket tidspunkt har vi",
                "hvor sent er det",
                "kan du fortælle mig hvad tid det er",
                "hvad er klokken blevet",
                "jeg vil gerne vide hvad klokken er",
                "fortæl mig venligst hvad klokken er",
                "jeg har brug for at vide hvad tid det er",
                "hvad er uret",
                "kender du tiden",
                "kan du sige hvad klokken er",
                "må jeg høre hvad klokken er",
                "hvad viser uret",
                "jeg skal vide hvad klokken er",
                "hvad er tiden lige nu",
                "hvad er klokken på dette tidspunkt",
                "hvor langt er vi på dagen",
                "hvilket klokkeslæt har vi",
                "sig mig venligst hvad klokken er",
                "kan du tjekke klokken",
                "hvad er klokken lige nu",
                "er den meget",
                "tiden nu",
                "fortæl mig hvad klokken er",
                "hvad tid er det nu",
                "hvad er uret lige nu",
                "jeg vil vide hvad klokken er",
                "fortæl tiden",
            ],
            &[],
        ),
        group(
            "get_date",
            &[
                "hvilken dag er det i dag",
                "hvad er datoen",
                "fortæl mig dagens dato",
                "hvad er det for en dag i dag",
                "dato",
                "hvilken dag er det",
                "hvilken ugedag er det",
                "hvad er det for en dag",
                "er det mandag i dag",
                "hvilken dato har vi",
                "hvilken måned er det",
                "hvad er datoen i dag",
                "kan du fortælle mig hvilken dato vi har",
                "hvad er det for en ugedag",
                "fortæl mig hvilken dag det er",
                "hvilken dag i ugen er det",
                "hvilket årstal er det",
                "hvilken dag i måneden har vi",
                "hvilken måned har vi",
                "hvad er det for en dag i ugen",
                "hvilken dato skriver vi",
                "hvad er det for en måned",
                "hvilken årstid er det",
                "hvilken dag har vi i dag",
                "er det weekend",
                "er det en helligdag i dag",
                "hvilken dag er det i morgen",
                "hvilken dato er det i dag",
                "kan du fortælle mig hvilken dag i ugen det er",
                "er det fredag i dag",
                "hvad er dagen i dag",
                "hvilken ugedag har vi",
                "er det tirsdag",
                "hvilken dato er det",
                "fortæl mig datoen",
                "hvilken dag har vi",
                "hvad er dagens dato",
                "er vi i juni måned",
                "hvilket år har vi",
            ],
            &[],
        ),
        group(
            "tell_joke",
            &[
                "fortæl mig en joke",
                "kan du fortælle en vittighed",
                "sig noget sjovt",
                "fortæl en vittighed",
                "fortæl noget morsomt",
                "jeg trænger til at grine",
                "kender du en god joke",
                "kan du få mig til at grine",
                "har du en vittighed",
                "vær sjov",
                "fortæl en god joke",
                "kender du nogle vittigheder",
                "jeg vil gerne høre noget sjovt",
                "kan du sige noget morsomt",
                "fortæl mig noget der kan få mig til at grine",
                "jeg har brug for at grine lidt",
                "har du nogle gode jokes",
                "kan du muntre mig op med en vittighed",
                "jeg vil gerne høre en vittighed",
                "gør mig i godt humør med en joke",
                "fortæl mig en sjov historie",
                "kender du en vittighed",
                "har du nogle jokes på lager",
                "jeg kunne godt bruge noget at grine af",
                "kan du fortælle en joke",
                "giv mig noget at grine af",
                "fortæl mig den sjoveste joke du kender",
                "har du en sjov vittighed at fortælle",
                "jeg vil gerne have en vittighed",
                "kan du få mig til at smile med en joke",
            ],
            &[],
        ),
        group(
            "open_website",
            &[
                "åbn youtube",
                "kan du åbne google",
                "åbn dr",
                "gå til youtube",
                "åbn en hjemmeside",
                "vis mig dr.dk",
                "kan du vise youtube",
                "jeg vil gerne på google",
                "åbn en browser",
                "gå til dr.dk",
                "åbn facebook",
                "kan du åbne netflix",
                "gå ind på tv2.dk",
                "åbn min e-mail",
                "kan du åbne gmail",
                "jeg vil gerne tjekke nyhederne på dr.dk",
                "åbn wikipedia",
                "vis mig facebook hjemmesiden",
                "kan du åbne amazon",
                "vis mig instagram",
                "start browseren",
                "åbn min email",
                "jeg vil gerne tjekke min e-mail",
                "kan du vise mig tv2's hjemmeside",
                "åbn dr1",
                "åbn min favorit hjemmeside",
                "jeg vil gerne se youtube",
                "åbn en ny browser",
                "kan du starte min internet browser",
                "vis mig google",
                "jeg vil tjekke facebook",
                "jeg vil på youtube",
                "start youtube",
                "start google",
                "start facebook",
                "kan du åbne en hjemmeside for mig",
                "søg på google",
                "søg på youtube",
                "gå til min e-mail",
                "åben browser",
            ],
            &[],
        ),
        group(
            "get_help",
            &[
                "hvad kan du",
                "hvad kan du hjælpe med",
                "hvilke kommandoer forstår du",
                "hvad skal jeg sige",
                "hvordan bruger jeg dig",
                "hjælp",
                "jeg har brug for hjælp",
                "hvad er dine funktioner",
                "vis mig en liste over kommandoer",
                "hvilke ting kan du gøre",
                "hvordan fungerer du",
                "forklar mig hvordan du virker",
                "vejledning",
                "guide mig",
                "hvordan kan jeg bruge dig",
                "vis mig mulighederne",
                "hvilke opgaver kan du udføre",
                "fortæl mig om dine funktioner",
                "hvad kan jeg spørge dig om",
                "hvad skal jeg gøre for at bruge dig",
                "jeg ved ikke hvad jeg skal spørge om",
                "giv mig en liste over dine kommandoer",
                "hvad kan du svare på",
                "vis en hjælpeguide",
                "fortæl mig hvordan du kan hjælpe mig",
                "hvad er dine muligheder",
                "jeg forstår ikke hvordan man bruger dig",
                "hvad kan du bruges til",
                "hvilke spørgsmål kan du besvare",
            ],
            &[],
        ),
        group(
            "greeting",
            &[
                "hej",
                "goddag",
                "godmorgen",
                "godaften",
                "hejsa",
                "halløj",
                "davs",
                "god eftermiddag",
                "hilser",
                "hej med dig",
                "hallo",
                "dav",
                "goddav",
                "mojn",
                "hej jarvis",
                "hej med dig jarvis",
                "god dag til dig",
                "hvordan går det",
                "hvordan har du det",
                "hyggeligt at møde dig",
                "godmorgen jarvis",
                "godaften jarvis",
                "god eftermiddag jarvis",
                "hej hej",
                "hejsa med dig",
                "god dag",
                "heyhey",
                "hej du",
                "hej hej med dig",
            ],
            &[],
        ),
        group(
            "goodbye",
            &[
                "farvel",
                "vi ses",
                "hav en god dag",
                "tak for i dag",
                "vi tales ved",
                "hej hej",
                "farveller",
                "jeg går nu",
                "afslut",
                "luk ned",
                "på gensyn",
                "ses senere",
                "ses i morgen",
                "godnat",
                "tak for hjælpen",
                "slut for i dag",
                "jeg er færdig",
                "jeg skal gå nu",
                "tak for nu",
                "jeg er færdig med at snakke",
                "tak for denne gang",
                "tak og farvel",
                "vi snakkes ved",
                "jeg er færdig for nu",
                "lukker ned",
                "jeg vil sige farvel nu",
                "tak for en god snak",
                "ses snart",
                "jeg kommer igen senere",
            ],
            &[],
        ),
        group(
            "save_note",
            &[
                "gem en note",
                "skriv ned",
                "husk at",
                "vil du huske",
                "gem denne note",
                "skriv i min notesbog",
                "jeg vil gerne notere følgende",
                "lav et notat med",
                "kan du gemme denne information",
                "gem teksten",
                "noter dette",
                "lav en huskeseddel",
                "gem en påmindelse om",
                "skriv en note med",
                "tilføj til mine noter",
                "gem dette til senere",
                "jeg har brug for at huske",
                "opret en note med følgende",
                "husk denne besked",
                "kan du skrive en note til mig",
                "skriv dette ned for mig",
                "gem en huskeliste",
                "skriv en besked til mig selv",
                "jeg vil gerne gemme en note",
                "husk mig på",
                "skriv ned i min kalender",
                "opret en huskeliste",
                "noter følgende punkter",
                "vil du skrive en note til mig",
                "gem dette som en påmindelse",
            ],
            &[],
        ),
        group(
            "about_you",
            &[
                "hvem er du",
                "fortæl om dig selv",
                "hvad hedder du",
                "hvad er dit navn",
                "er du en robot",
                "er du kunstig intelligens",
                "hvem har lavet dig",
                "hvordan er du lavet",
                "hvilken type ai er du",
                "fortæl mig om dig selv",
                "hvad er du for en",
                "hvad kan du fortælle om dig selv",
                "hvad er formålet med dig",
                "hvad er din funktion",
                "er du menneskelig",
                "er du en computer",
                "hvad er du",
                "hvordan blev du skabt",
                "hvor gammel er du",
                "hvilken ai er du",
                "beskriv dig selv",
                "hvad er din historie",
                "hvad er din oprindelse",
                "hvad er din baggrund",
                "hvad er dit formål",
                "hvordan virker du",
                "hvad er dine egenskaber",
                "er du en chatbot",
                "hvem kontrollerer dig",
                "fortæl hvem du er",
                "kan du fortælle mig om dig selv",
                "introducer dig selv",
                "hvem eller hvad er du",
                "er du en ai",
                "er du en assistent",
                "hvad er dit job",
                "hvem skabte dig",
            ],
            &[],
        ),
        group(
            "get_weather",
            &[
                "hvordan bliver vejret",
                "hvordan er vejret i dag",
                "hvad siger vejrudsigten",
                "skal jeg tage en paraply med",
                "bliver det regn i dag",
                "hvordan er temperaturen udenfor",
                "bliver det solskin",
                "kommer det til at regne",
                "hvordan er vejret i morgen",
                "skal jeg have en jakke på",
                "bliver det varmt i dag",
                "vejrudsigt for i dag",
                "hvad med vejret i weekenden",
                "fortæl mig om vejret",
                "hvordan er vejrforholdene",
                "er det koldt udenfor",
                "bliver det blæsevejr",
                "hvad er temperaturen lige nu",
                "hvordan er vejrudsigten for i aften",
                "er det godt vejr til en gåtur",
                "hvor varmt bliver det",
                "hvad er temperaturen",
                "skal jeg tage min regnjakke med",
                "bliver det overskyet",
                "er det tørvejr i dag",
                "vil det regne senere",
                "hvad er vejrudsigten for weekenden",
                "bliver det et dejligt vejr",
                "fortæl mig om vejrsituationen",
            ],
            &[
                "Jeg har desværre ikke adgang til vejrudsigten endnu, men kig ud ad vinduet, så er du helt opdateret!",
                "Vejrtjenesten er ikke koblet til endnu. Prøv dr.dk/vejret for en rigtig udsigt.",
            ],
        ),
        group(
            "play_music",
            &[
                "spil noget musik",
                "kan du afspille musik",
                "jeg vil høre musik",
                "spil min yndlingssang",
                "spil noget afslapningsmusik",
                "start afspilning af musik",
                "jeg vil gerne høre noget musik",
                "kan du spille en sang",
                "musik",
                "afspil en sang",
                "spil noget jazz",
                "start musikafspiller",
                "afspil min spilleliste",
                "jeg har lyst til at høre musik",
                "kan du afspille noget klassisk",
                "jeg vil gerne have musik i baggrunden",
                "spil den seneste musik",
                "afspil min favoritmusik",
                "start noget musik",
                "jeg trænger til noget musik",
                "kan du afspille en god sang",
                "afspil musik fra min playliste",
                "sæt noget musik på",
                "spil en sang for mig",
                "jeg vil gerne have noget musik",
                "kan du give mig noget at lytte til",
                "spil noget roligt musik",
                "jeg har brug for musik",
                "afspil populær musik",
                "spil en dejlig melodi",
            ],
            &[
                "Musikafspilning er ikke sat op endnu. Åbn YouTube, så finder vi noget musik der.",
                "Jeg kan ikke spille musik selv endnu, men sig 'åbn youtube', så er vi i gang.",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_intents() {
        let groups = seed_groups();
        assert_eq!(groups.len(), 11);
        let tags: Vec<&str> = groups.iter().map(|g| g.tag.as_str()).collect();
        assert!(tags.contains(&"greeting"));
        assert!(tags.contains(&"get_time"));
        assert!(tags.contains(&"play_music"));
    }

    #[test]
    fn every_group_has_enough_examples() {
        for group in seed_groups() {
            assert!(
                group.patterns.len() >= 25,
                "{} har kun {} ytringer",
                group.tag,
                group.patterns.len()
            );
        }
    }

    #[test]
    fn no_duplicates_within_a_group() {
        for group in seed_groups() {
            let mut seen = std::collections::HashSet::new();
            for p in &group.patterns {
                assert!(seen.insert(p), "dublet i {}: {}", group.tag, p);
            }
        }
    }
}
