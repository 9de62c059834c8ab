/// Named geologic time spans as `(name, start, end)` in millions of years before present.
///
/// Parents precede their children, so table order is also a top-down walk of
/// the hierarchy.
pub(super) const SPANS_MA: &[(&str, f64, f64)] = &[
    ("precambrian", 4600.0, 541.0),
    ("hadean", 4600.0, 4000.0),
    ("archaean", 4000.0, 2500.0),
    ("eoarchean", 4000.0, 3600.0),
    ("isuan", 4000.0, 3600.0),
    ("paleoarchean", 3600.0, 3200.0),
    ("mesoarchean", 3200.0, 2800.0),
    ("neoarchean", 2800.0, 2500.0),
    ("proterozoic", 2500.0, 541.0),
    ("early proterozoic", 2500.0, 1600.0),
    ("paleoproterozoic", 2500.0, 1600.0),
    ("siderian", 2500.0, 2300.0),
    ("rhyacian", 2300.0, 2050.0),
    ("orosirian", 2050.0, 1800.0),
    ("statherian", 1800.0, 1600.0),
    ("middle proterozoic", 1600.0, 1000.0),
    ("mesoproterozoic", 1600.0, 1000.0),
    ("calymmian", 1600.0, 1400.0),
    ("ectasian", 1400.0, 1200.0),
    ("riphean", 1400.0, 1200.0),
    ("stenian", 1200.0, 1000.0),
    ("mayanian", 1100.0, 1050.0),
    ("sinian", 1050.0, 1000.0),
    ("sturtian", 1050.0, 1000.0),
    ("late proterozoic", 1000.0, 541.0),
    ("neoproterozoic", 1000.0, 541.0),
    ("tonian", 1000.0, 850.0),
    ("baikalian", 850.0, 720.0),
    ("cryogenian", 720.0, 635.0),
    ("ediacaran", 635.0, 541.0),
    ("vendian", 635.0, 541.0),
    ("phanerozoic", 541.0, 0.0),
    ("paleozoic", 541.0, 251.902),
    ("cambrian", 541.0, 485.4),
    ("lower cambrian", 541.0, 509.0),
    ("terreneuvian", 541.0, 521.0),
    ("lowest cambrian", 541.0, 521.0),
    ("earliest cambrian", 541.0, 521.0),
    ("fortunian", 541.0, 529.0),
    ("manykaian", 541.0, 530.0),
    ("nemakit daldynian", 541.0, 530.0),
    ("caerfai", 530.0, 529.0),
    ("tommotian", 530.0, 529.0),
    ("cambrian stage 2", 529.0, 521.0),
    ("cambrian series 2", 522.0, 509.0),
    ("cambrian stage 3", 522.0, 514.0),
    ("middle lower cambrian", 522.0, 514.0),
    ("botomian", 522.0, 521.0),
    ("atdabanian", 521.0, 516.0),
    ("toyonian", 516.0, 514.0),
    ("upper lower cambrian", 516.0, 514.0),
    ("cambrian stage 4", 514.0, 509.0),
    ("miaolingian", 509.0, 497.0),
    ("cambrian series 3", 509.0, 497.0),
    ("middle cambrian", 509.0, 497.0),
    ("wuliuan", 509.0, 504.5),
    ("cambrian stage 5", 509.0, 504.5),
    ("lower middle cambrian", 509.0, 504.5),
    ("st davids", 509.0, 504.5),
    ("drumian", 504.5, 500.5),
    ("guzhangian", 500.5, 497.0),
    ("nganasanian", 500.5, 497.0),
    ("mindyallan", 500.5, 497.0),
    ("furongian", 497.0, 485.4),
    ("upper cambrian", 497.0, 485.4),
    ("merioneth", 497.0, 485.4),
    ("paibian", 497.0, 494.0),
    ("franconian", 497.0, 494.0),
    ("jiangshanian", 494.0, 485.4),
    ("cambrian stage 10", 489.5, 485.4),
    ("ordovician", 485.4, 443.8),
    ("lower ordovician", 485.4, 470.0),
    ("tremadocian", 485.4, 477.7),
    ("upper lower ordovician", 479.0, 477.7),
    ("floian", 477.7, 470.0),
    ("arenig", 477.7, 470.0),
    ("middle ordovician", 470.0, 458.4),
    ("dapingian", 470.0, 458.4),
    ("ordovician iii", 470.0, 458.4),
    ("lower middle ordovician", 470.0, 458.4),
    ("darriwilian", 467.3, 458.4),
    ("upper ordovician", 458.4, 443.8),
    ("sandbian", 458.4, 453.0),
    ("ordovician v", 458.4, 453.0),
    ("lower upper ordovician", 458.4, 453.0),
    ("middle upper ordovician", 455.0, 453.0),
    ("katian", 453.0, 445.2),
    ("ordovician vi", 453.0, 445.2),
    ("hirnantian", 445.2, 443.8),
    ("silurian", 443.8, 419.2),
    ("llandovery", 443.8, 433.4),
    ("lower silurian", 443.8, 433.4),
    ("rhuddanian", 443.8, 440.8),
    ("aeronian", 440.8, 438.5),
    ("telychian", 438.5, 433.4),
    ("wenlock", 433.4, 427.4),
    ("sheinwoodian", 433.4, 430.5),
    ("homerian", 430.5, 427.0),
    ("ludlow", 427.4, 423.0),
    ("upper silurian", 427.4, 423.0),
    ("gorstian", 427.4, 425.6),
    ("ludfordian", 425.6, 423.0),
    ("pridoli", 423.0, 419.2),
    ("unnamed pridoli stage", 423.0, 419.2),
    ("devonian", 419.2, 358.9),
    ("lower devonian", 419.2, 393.3),
    ("lochkovian", 419.2, 410.8),
    ("downtonian", 419.2, 410.8),
    ("pragian", 410.8, 407.6),
    ("praghian", 410.8, 407.6),
    ("emsian", 407.6, 393.3),
    ("middle devonian", 393.3, 382.7),
    ("eifelian", 393.3, 387.7),
    ("givetian", 387.7, 382.7),
    ("upper devonian", 382.7, 358.9),
    ("frasnian", 382.7, 372.2),
    ("famennian", 372.2, 358.9),
    ("carboniferous", 358.9, 298.9),
    ("mississippian", 358.9, 323.2),
    ("lower carboniferous", 358.9, 323.2),
    ("lower mississippian", 358.9, 346.7),
    ("tournaisian", 358.9, 346.7),
    ("middle mississippian", 346.7, 330.9),
    ("visean", 346.7, 330.9),
    ("upper mississippian", 330.9, 323.2),
    ("serpukhovian", 330.9, 323.2),
    ("namurian", 326.0, 323.2),
    ("pennsylvanian", 323.2, 298.9),
    ("upper carboniferous", 323.2, 298.9),
    ("lower pennsylvanian", 323.2, 315.2),
    ("bashkirian", 323.2, 315.2),
    ("middle pennsylvanian", 315.2, 307.0),
    ("moscovian", 315.2, 307.0),
    ("westphalian", 313.0, 304.0),
    ("upper pennsylvanian", 307.0, 298.9),
    ("kasimovian", 307.0, 303.7),
    ("stephanian", 304.0, 303.7),
    ("gzhelian", 303.7, 298.9),
    ("permian", 298.9, 251.902),
    ("cisuralian", 298.9, 272.95),
    ("lower permian", 298.9, 272.95),
    ("asselian", 298.9, 295.0),
    ("sakmarian", 295.0, 290.1),
    ("artinskian", 290.1, 283.5),
    ("kungurian", 283.5, 272.95),
    ("guadalupian", 272.95, 259.1),
    ("middle permian", 272.95, 259.1),
    ("roadian", 272.95, 268.8),
    ("ufimian", 272.95, 268.8),
    ("wordian", 268.8, 265.1),
    ("capitanian", 265.1, 259.1),
    ("lopingian", 259.1, 251.902),
    ("upper permian", 259.1, 251.902),
    ("wuchiapingian", 259.1, 254.14),
    ("longtanian", 259.1, 254.14),
    ("changhsingian", 254.14, 251.902),
    ("mesozoic", 251.902, 66.0),
    ("triassic", 251.902, 201.3),
    ("lower triassic", 251.902, 247.2),
    ("induan", 251.902, 251.2),
    ("olenekian", 251.2, 247.2),
    ("spathian", 251.2, 247.2),
    ("middle triassic", 247.2, 237.0),
    ("anisian", 247.2, 242.0),
    ("ladinian", 242.0, 237.0),
    ("upper triassic", 237.0, 201.3),
    ("carnian", 237.0, 227.0),
    ("norian", 227.0, 208.5),
    ("rhaetian", 208.5, 201.3),
    ("jurassic", 201.3, 145.0),
    ("lower jurassic", 201.3, 174.1),
    ("hettangian", 201.3, 199.3),
    ("sinemurian", 199.3, 190.8),
    ("pliensbachian", 190.8, 182.7),
    ("toarcian", 182.7, 174.1),
    ("middle jurassic", 174.1, 163.5),
    ("aalenian", 174.1, 170.3),
    ("bajocian", 170.3, 168.3),
    ("bathonian", 168.3, 166.1),
    ("callovian", 166.1, 163.5),
    ("upper jurassic", 163.5, 145.0),
    ("oxfordian", 163.5, 157.3),
    ("kimmeridgian", 157.3, 152.1),
    ("tithonian", 152.1, 145.0),
    ("cretaceous", 145.0, 66.0),
    ("lower cretaceous", 145.0, 100.5),
    ("berriasian", 145.0, 139.8),
    ("neocomian", 145.0, 139.8),
    ("valanginian", 139.8, 132.9),
    ("hauterivian", 132.9, 129.4),
    ("barremian", 129.4, 125.0),
    ("gallic", 129.4, 125.0),
    ("aptian", 125.0, 100.5),
    ("albian", 113.0, 100.5),
    ("upper cretaceous", 100.5, 66.0),
    ("cenomanian", 100.5, 93.9),
    ("turonian", 93.9, 89.8),
    ("coniacian", 89.8, 86.3),
    ("senonian", 89.8, 86.3),
    ("santonian", 86.3, 83.6),
    ("campanian", 83.6, 72.1),
    ("maastrichtian", 72.1, 66.0),
    ("cenozoic", 66.0, 0.0),
    ("tertiary", 66.0, 2.58),
    ("paleogene", 66.0, 56.0),
    ("paleocene", 66.0, 56.0),
    ("danian", 66.0, 61.6),
    ("lower paleocene", 66.0, 61.6),
    ("puercan", 65.0, 63.3),
    ("torrejonian", 63.3, 61.6),
    ("selandian", 61.6, 59.2),
    ("middle paleocene", 61.6, 59.2),
    ("tiffanian", 60.2, 59.2),
    ("thanetian", 59.2, 56.0),
    ("upper paleocene", 59.2, 56.0),
    ("clarkforkian", 56.8, 56.0),
    ("eocene", 56.0, 33.9),
    ("ypresian", 56.0, 47.8),
    ("lower eocene", 56.0, 47.8),
    ("mp 10", 56.0, 47.8),
    ("wasatchian", 55.4, 50.3),
    ("bridgerian", 50.3, 47.8),
    ("middle eocene", 47.8, 37.8),
    ("lutetian", 47.8, 41.2),
    ("mp 11", 47.8, 41.2),
    ("uintan", 46.2, 42.0),
    ("duchesnean", 42.0, 41.2),
    ("bartonian", 41.2, 37.8),
    ("chadronian", 38.0, 37.8),
    ("priabonian", 37.8, 33.9),
    ("upper eocene", 37.8, 33.9),
    ("oligocene", 33.9, 23.03),
    ("rupelian", 33.9, 28.1),
    ("lower oligocene", 33.9, 28.1),
    ("orellan", 33.9, 33.3),
    ("whitneyan", 33.3, 30.6),
    ("arikeean", 30.6, 28.1),
    ("chattian", 28.1, 23.03),
    ("upper oligocene", 28.1, 23.03),
    ("neogene", 23.03, 2.58),
    ("miocene", 23.03, 5.333),
    ("lower miocene", 23.03, 15.97),
    ("aquitanian", 23.03, 20.44),
    ("hemingfordian", 20.6, 20.44),
    ("burdigalian", 20.44, 15.97),
    ("barstovian", 16.3, 15.97),
    ("middle miocene", 15.97, 11.63),
    ("langhian", 15.97, 13.82),
    ("serravallian", 13.82, 11.63),
    ("clarendonian", 13.6, 11.63),
    ("upper miocene", 11.63, 5.333),
    ("tortonian", 11.63, 7.246),
    ("hemphillian", 10.3, 7.246),
    ("messinian", 7.246, 5.333),
    ("pliocene", 5.333, 2.58),
    ("zanclean", 5.333, 3.6),
    ("lower pliocene", 5.333, 3.6),
    ("blancan", 4.75, 3.6),
    ("piacenzian", 3.6, 2.58),
    ("upper pliocene", 3.6, 2.58),
    ("quaternary", 2.58, 0.0),
    ("pleistocene", 2.58, 0.0117),
    ("lower pleistocene", 2.58, 0.781),
    ("gelasian", 2.58, 1.8),
    ("calabrian", 1.8, 0.781),
    ("irvingtonian", 1.8, 0.781),
    ("middle pleistocene", 0.781, 0.126),
    ("rancholabrean", 0.24, 0.126),
    ("upper pleistocene", 0.126, 0.0117),
    ("holocene", 0.0117, 0.0),
    ("greenlandian", 0.0117, 0.0),
    ("northgrippian", 0.0082, 0.0042),
    ("meghalayan", 0.0042, 0.0),
    ("now", 0.0, 0.0),
    ("recent", 0.0, 0.0),
    ("present", 0.0, 0.0),
    ("current", 0.0, 0.0),
];
